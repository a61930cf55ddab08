/// PostgreSQL entity store
///
/// Each collection is a table holding one JSONB document per row:
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     seq BIGSERIAL NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     data JSONB NOT NULL DEFAULT '{}'
/// );
/// CREATE UNIQUE INDEX projects_enrollment_id_key ON projects ((data->>'enrollment_id'));
/// ```
///
/// Uniqueness is enforced by expression indexes named after
/// [`Collection::constraint_name`], so a `23505` violation maps straight back
/// to the offending fields.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskboard_shared::store::{postgres::PgStore, EntityStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store = PgStore::new(pool);
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{lazy_stream, Collection, Document, DocumentStream, EntityStore, Fields, Filter, StoreError, StoreResult};

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Entity store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    data: JsonValue,
}

impl DocumentRow {
    fn into_document(self) -> Document {
        let fields = match self.data {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };

        Document {
            id: self.id,
            created_at: self.created_at,
            fields,
        }
    }
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a sqlx error for `collection`, recognizing unique violations
fn map_error(collection: Collection, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let fields = db_err
                .constraint()
                .and_then(|name| collection.fields_for_constraint(name))
                .unwrap_or_default();
            return StoreError::Uniqueness { collection, fields };
        }
    }

    warn!(collection = %collection, error = %err, "Store query failed");
    StoreError::transport(err)
}

/// Splits a filter into an optional id match and a JSONB containment object
fn split_filter(filter: &Filter) -> StoreResult<(Option<Uuid>, JsonValue)> {
    let mut id = None;
    let mut contains = Map::new();

    for (field, value) in filter.conditions() {
        if field == "id" {
            let raw = value.as_str().unwrap_or_default();
            let parsed = Uuid::parse_str(raw)
                .map_err(|e| StoreError::Serialization(format!("invalid id filter: {}", e)))?;
            id = Some(parsed);
        } else {
            contains.insert(field.clone(), value.clone());
        }
    }

    Ok((id, JsonValue::Object(contains)))
}

async fn select_matching(
    pool: PgPool,
    collection: Collection,
    filter: Filter,
) -> StoreResult<Vec<Document>> {
    let (id, contains) = split_filter(&filter)?;

    let sql = format!(
        "SELECT id, created_at, data FROM {} \
         WHERE data @> $1 AND ($2::uuid IS NULL OR id = $2) \
         ORDER BY seq ASC",
        collection.as_str()
    );

    debug!(collection = %collection, filter = %contains, "Filtering documents");

    let rows = sqlx::query_as::<_, DocumentRow>(&sql)
        .bind(contains)
        .bind(id)
        .fetch_all(&pool)
        .await
        .map_err(|e| map_error(collection, e))?;

    Ok(rows.into_iter().map(DocumentRow::into_document).collect())
}

#[async_trait]
impl EntityStore for PgStore {
    async fn create(&self, collection: Collection, mut fields: Fields) -> StoreResult<Document> {
        fields.remove("id");
        fields.remove("created_at");

        let sql = format!(
            "INSERT INTO {} (data) VALUES ($1) RETURNING id, created_at, data",
            collection.as_str()
        );

        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(JsonValue::Object(fields))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_error(collection, e))?;

        Ok(row.into_document())
    }

    async fn get(&self, collection: Collection, id: Uuid) -> StoreResult<Document> {
        let sql = format!(
            "SELECT id, created_at, data FROM {} WHERE id = $1",
            collection.as_str()
        );

        sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_error(collection, e))?
            .map(DocumentRow::into_document)
            .ok_or(StoreError::NotFound { collection, id })
    }

    fn filter(&self, collection: Collection, filter: Filter) -> DocumentStream {
        let pool = self.pool.clone();
        lazy_stream(select_matching(pool, collection, filter))
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        mut patch: Fields,
    ) -> StoreResult<Document> {
        patch.remove("id");
        patch.remove("created_at");

        // jsonb || merges top-level keys, leaving absent ones untouched
        let sql = format!(
            "UPDATE {} SET data = data || $2 WHERE id = $1 RETURNING id, created_at, data",
            collection.as_str()
        );

        sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .bind(JsonValue::Object(patch))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_error(collection, e))?
            .map(DocumentRow::into_document)
            .ok_or(StoreError::NotFound { collection, id })
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> StoreResult<Document> {
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 RETURNING id, created_at, data",
            collection.as_str()
        );

        sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_error(collection, e))?
            .map(DocumentRow::into_document)
            .ok_or(StoreError::NotFound { collection, id })
    }

    async fn ping(&self) -> StoreResult<()> {
        crate::db::pool::health_check(&self.pool)
            .await
            .map_err(StoreError::transport)
    }
}
