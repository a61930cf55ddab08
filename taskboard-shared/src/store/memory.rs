//! In-memory entity store for tests and single-process development.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use super::{lazy_stream, Collection, Document, DocumentStream, EntityStore, Fields, Filter, StoreError, StoreResult};

/// Thread-safe in-memory store
///
/// Cloning shares the underlying state. Uniqueness checks and the write they
/// guard happen under one write lock, so concurrent creates cannot both pass.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_seq: u64,
    tables: HashMap<Collection, Table>,
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<u64, Document>,
    index: HashMap<Uuid, u64>,
}

impl Table {
    fn get(&self, id: Uuid) -> Option<&Document> {
        self.index.get(&id).and_then(|seq| self.rows.get(seq))
    }

    /// Finds the first constraint `candidate` would violate, ignoring `exclude`
    fn violated_constraint(
        &self,
        collection: Collection,
        candidate: &Fields,
        exclude: Option<Uuid>,
    ) -> Option<Vec<String>> {
        collection
            .unique_constraints()
            .iter()
            .find(|fields| {
                let values: Option<Vec<&JsonValue>> = fields
                    .iter()
                    .map(|f| candidate.get(*f).filter(|v| !v.is_null()))
                    .collect();

                let Some(values) = values else {
                    return false;
                };

                self.rows.values().any(|row| {
                    Some(row.id) != exclude
                        && fields
                            .iter()
                            .zip(values.iter())
                            .all(|(f, v)| row.fields.get(*f) == Some(*v))
                })
            })
            .map(|fields| fields.iter().map(|f| f.to_string()).collect())
    }
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a collection
    pub fn len(&self, collection: Collection) -> usize {
        self.state
            .read()
            .map(|state| state.tables.get(&collection).map_or(0, |t| t.rows.len()))
            .unwrap_or(0)
    }

    /// Whether a collection holds no records
    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }
}

fn poisoned(err: impl std::fmt::Display) -> StoreError {
    StoreError::transport(std::io::Error::other(err.to_string()))
}

fn snapshot(
    state: &RwLock<MemoryState>,
    collection: Collection,
    filter: &Filter,
) -> StoreResult<Vec<Document>> {
    let state = state.read().map_err(poisoned)?;
    Ok(state
        .tables
        .get(&collection)
        .map(|table| {
            table
                .rows
                .values()
                .filter(|doc| filter.matches(doc))
                .cloned()
                .collect()
        })
        .unwrap_or_default())
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn create(&self, collection: Collection, mut fields: Fields) -> StoreResult<Document> {
        fields.remove("id");
        fields.remove("created_at");

        let mut state = self.state.write().map_err(poisoned)?;
        let seq = state.next_seq;
        let table = state.tables.entry(collection).or_default();

        if let Some(violated) = table.violated_constraint(collection, &fields, None) {
            return Err(StoreError::Uniqueness {
                collection,
                fields: violated,
            });
        }

        let doc = Document {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            fields,
        };
        table.index.insert(doc.id, seq);
        table.rows.insert(seq, doc.clone());
        state.next_seq = seq + 1;

        Ok(doc)
    }

    async fn get(&self, collection: Collection, id: Uuid) -> StoreResult<Document> {
        let state = self.state.read().map_err(poisoned)?;
        state
            .tables
            .get(&collection)
            .and_then(|table| table.get(id))
            .cloned()
            .ok_or(StoreError::NotFound { collection, id })
    }

    fn filter(&self, collection: Collection, filter: Filter) -> DocumentStream {
        let state = Arc::clone(&self.state);
        lazy_stream(async move { snapshot(&state, collection, &filter) })
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        mut patch: Fields,
    ) -> StoreResult<Document> {
        patch.remove("id");
        patch.remove("created_at");

        let mut state = self.state.write().map_err(poisoned)?;
        let table = state
            .tables
            .get_mut(&collection)
            .ok_or(StoreError::NotFound { collection, id })?;

        let mut merged = table
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound { collection, id })?;
        merged.fields.extend(patch);

        if let Some(violated) = table.violated_constraint(collection, &merged.fields, Some(id)) {
            return Err(StoreError::Uniqueness {
                collection,
                fields: violated,
            });
        }

        if let Some(seq) = table.index.get(&id).copied() {
            table.rows.insert(seq, merged.clone());
        }
        Ok(merged)
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> StoreResult<Document> {
        let mut state = self.state.write().map_err(poisoned)?;
        state
            .tables
            .get_mut(&collection)
            .and_then(|table| {
                let seq = table.index.remove(&id)?;
                table.rows.remove(&seq)
            })
            .ok_or(StoreError::NotFound { collection, id })
    }

    async fn ping(&self) -> StoreResult<()> {
        self.state.read().map(|_| ()).map_err(poisoned)
    }
}
