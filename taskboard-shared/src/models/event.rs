/// Event model and store operations
///
/// An event is a time-bounded grouping owned by one user. Tasks reference an
/// event through `Task::event_id`; the event never points back.
///
/// # Collection
///
/// `events`, no unique constraints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::Priority;
use crate::store::{to_fields, Collection, EntityStore, Filter, StoreResult};

/// A scheduled event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Store record id
    pub id: Uuid,

    pub name: String,

    #[serde(default)]
    pub short_description: String,

    /// Start of the event window (inclusive)
    pub starting_date: DateTime<Utc>,

    /// End of the event window (inclusive)
    pub ending_date: DateTime<Utc>,

    /// Identity id of the owner
    pub owner_id: String,

    pub priority_range: Priority,

    pub created_at: DateTime<Utc>,
}

/// Input for inserting an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub short_description: String,
    pub starting_date: DateTime<Utc>,
    pub ending_date: DateTime<Utc>,
    pub owner_id: String,
    pub priority_range: Priority,
}

impl NewEvent {
    /// Whether the window is well-formed (`starting_date <= ending_date`)
    pub fn has_valid_window(&self) -> bool {
        self.starting_date <= self.ending_date
    }
}

impl Event {
    /// Inserts an event
    pub async fn create(store: &dyn EntityStore, data: NewEvent) -> StoreResult<Self> {
        store
            .create(Collection::Events, to_fields(&data)?)
            .await?
            .into_record()
    }

    /// Fetches an event by id
    pub async fn find_by_id(store: &dyn EntityStore, id: Uuid) -> StoreResult<Self> {
        store.get(Collection::Events, id).await?.into_record()
    }

    /// Lists events owned by a user, oldest first
    pub async fn list_by_owner(store: &dyn EntityStore, owner_id: &str) -> StoreResult<Vec<Self>> {
        store
            .filter_all(Collection::Events, Filter::new().eq("owner_id", owner_id))
            .await?
            .into_iter()
            .map(|doc| doc.into_record())
            .collect()
    }
}
