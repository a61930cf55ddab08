/// Entity store adapter
///
/// This module defines the contract every record store backing the board must
/// honor. Records are JSON documents grouped into six collections; the store
/// assigns `id` and `created_at` and enforces the uniqueness constraints
/// declared by [`Collection::unique_constraints`].
///
/// # Backends
///
/// - [`memory::MemoryStore`]: process-local store for tests and development
/// - [`postgres::PgStore`]: PostgreSQL store (one JSONB table per collection)
///
/// # Example
///
/// ```
/// use taskboard_shared::store::{Collection, EntityStore, Filter, memory::MemoryStore};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
///
/// let fields = json!({ "name": "Roadmap", "owner_id": "user-1" });
/// let project = store
///     .create(Collection::Projects, fields.as_object().cloned().unwrap_or_default())
///     .await?;
///
/// let owned = store
///     .filter_all(Collection::Projects, Filter::new().eq("owner_id", "user-1"))
///     .await?;
/// assert_eq!(owned[0].id, project.id);
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Field map of a stored record (everything except `id` and `created_at`)
pub type Fields = Map<String, JsonValue>;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Lazy, finite stream of documents produced by [`EntityStore::filter`]
pub type DocumentStream = BoxStream<'static, StoreResult<Document>>;

/// Record collections known to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Users,
    Projects,
    Memberships,
    Tasks,
    Events,
    Comments,
}

impl Collection {
    /// Every collection, in migration order
    pub const ALL: [Collection; 6] = [
        Collection::Users,
        Collection::Projects,
        Collection::Memberships,
        Collection::Tasks,
        Collection::Events,
        Collection::Comments,
    ];

    /// Collection name, also used as the PostgreSQL table name
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Projects => "projects",
            Collection::Memberships => "memberships",
            Collection::Tasks => "tasks",
            Collection::Events => "events",
            Collection::Comments => "comments",
        }
    }

    /// Uniqueness constraints, each a set of fields whose combined values
    /// must be unique across the collection
    pub fn unique_constraints(&self) -> &'static [&'static [&'static str]] {
        match self {
            Collection::Users => &[&["user_id"], &["email"], &["phone"]],
            Collection::Projects => &[&["enrollment_id"]],
            Collection::Memberships => &[&["user_id", "project_id"]],
            Collection::Tasks | Collection::Events | Collection::Comments => &[],
        }
    }

    /// Name of the unique index backing a constraint (`<table>_<fields>_key`)
    pub fn constraint_name(&self, fields: &[&str]) -> String {
        format!("{}_{}_key", self.as_str(), fields.join("_"))
    }

    /// Resolves a unique index name back to its constrained fields
    pub fn fields_for_constraint(&self, name: &str) -> Option<Vec<String>> {
        self.unique_constraints()
            .iter()
            .find(|fields| self.constraint_name(fields) == name)
            .map(|fields| fields.iter().map(|f| f.to_string()).collect())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by store implementations
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// A designated unique field (or field set) already holds this value
    #[error("duplicate value for {collection}.{}", fields.join("+"))]
    Uniqueness {
        collection: Collection,
        fields: Vec<String>,
    },

    /// No record with this id exists
    #[error("{collection} record {id} not found")]
    NotFound { collection: Collection, id: Uuid },

    /// The store could not be reached or rejected the request
    #[error("store transport failure: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),

    /// A record could not be converted to or from its typed form
    #[error("record serialization failed: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Wraps a backend error as a transport failure
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Transport(Arc::new(err))
    }

    /// Whether this is a uniqueness violation on exactly the given field
    pub fn is_uniqueness_on(&self, field: &str) -> bool {
        matches!(self, StoreError::Uniqueness { fields, .. } if fields.len() == 1 && fields[0] == field)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// A stored record: store-assigned metadata plus its fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned identifier
    pub id: Uuid,

    /// Store-assigned creation timestamp
    pub created_at: DateTime<Utc>,

    /// Record fields
    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    /// Converts the document into a typed record
    pub fn into_record<T: DeserializeOwned>(self) -> StoreResult<T> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Reads a field as a string, if present
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(JsonValue::as_str)
    }
}

/// Serializes a typed input struct into a field map
///
/// `id` and `created_at` are stripped; they are always store-assigned.
pub fn to_fields<T: Serialize>(input: &T) -> StoreResult<Fields> {
    match serde_json::to_value(input)? {
        JsonValue::Object(mut map) => {
            map.remove("id");
            map.remove("created_at");
            Ok(map)
        }
        other => Err(StoreError::Serialization(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Conjunction of field-equality conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, JsonValue)>,
}

impl Filter {
    /// Creates a filter matching every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `field == value` condition (`id` matches the record id)
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// The conditions, in insertion order
    pub fn conditions(&self) -> &[(String, JsonValue)] {
        &self.conditions
    }

    /// Whether a document satisfies every condition
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|(field, expected)| {
            if field == "id" {
                return expected.as_str() == Some(doc.id.to_string().as_str());
            }
            doc.fields.get(field) == Some(expected)
        })
    }
}

/// Record store contract
///
/// Implementations must be safe to share between request handlers. Each
/// method is a single store round-trip; no method spans several mutations.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Creates a record, assigning `id` and `created_at`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Uniqueness`] when a unique constraint of the
    /// collection would be violated. Callers may retry with a new value.
    async fn create(&self, collection: Collection, fields: Fields) -> StoreResult<Document>;

    /// Fetches a record by id
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id does not exist.
    async fn get(&self, collection: Collection, id: Uuid) -> StoreResult<Document>;

    /// Streams the records matching `filter` in creation order
    ///
    /// Nothing runs until the stream is first polled; calling `filter` again
    /// re-executes the query.
    fn filter(&self, collection: Collection, filter: Filter) -> DocumentStream;

    /// Merges `patch` into an existing record; absent fields are left as-is
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id does not exist, or
    /// [`StoreError::Uniqueness`] when the patch collides with another record.
    async fn update(&self, collection: Collection, id: Uuid, patch: Fields)
        -> StoreResult<Document>;

    /// Deletes a record, returning it as it was before deletion
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id does not exist.
    async fn delete(&self, collection: Collection, id: Uuid) -> StoreResult<Document>;

    /// Verifies the store is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Runs [`EntityStore::filter`] to completion
    async fn filter_all(&self, collection: Collection, filter: Filter) -> StoreResult<Vec<Document>> {
        self.filter(collection, filter).try_collect().await
    }

    /// Returns the first record matching `filter`, if any
    async fn find_first(&self, collection: Collection, filter: Filter) -> StoreResult<Option<Document>> {
        let mut results = self.filter(collection, filter);
        results.next().await.transpose()
    }
}

/// Turns a deferred batch query into a lazy document stream
pub(crate) fn lazy_stream<F>(query: F) -> DocumentStream
where
    F: std::future::Future<Output = StoreResult<Vec<Document>>> + Send + 'static,
{
    stream::once(query)
        .flat_map(|result| {
            let items: Vec<StoreResult<Document>> = match result {
                Ok(docs) => docs.into_iter().map(Ok).collect(),
                Err(err) => vec![Err(err)],
            };
            stream::iter(items)
        })
        .boxed()
}
