/// Comment model and store operations
///
/// Comments are append-only: there is no update or delete.
///
/// # Collection
///
/// `comments`, no unique constraints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{to_fields, Collection, EntityStore, Filter, StoreResult};

/// A comment on a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Store record id
    pub id: Uuid,

    /// Identity id of the author
    pub user_id: String,

    pub task_id: Uuid,

    pub content: String,

    pub created_at: DateTime<Utc>,
}

/// Input for inserting a comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub user_id: String,
    pub task_id: Uuid,
    pub content: String,
}

impl Comment {
    /// Appends a comment
    pub async fn create(store: &dyn EntityStore, data: NewComment) -> StoreResult<Self> {
        store
            .create(Collection::Comments, to_fields(&data)?)
            .await?
            .into_record()
    }

    /// Lists the comments of a task in store order
    pub async fn list_by_task(store: &dyn EntityStore, task_id: Uuid) -> StoreResult<Vec<Self>> {
        store
            .filter_all(
                Collection::Comments,
                Filter::new().eq("task_id", task_id.to_string()),
            )
            .await?
            .into_iter()
            .map(|doc| doc.into_record())
            .collect()
    }
}
