/// Event service
///
/// Events are owned by one user and span `starting_date..=ending_date`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BoardError, BoardResult};
use crate::models::event::{Event, NewEvent};
use crate::models::task::Priority;
use crate::store::EntityStore;

/// Input for [`create_event`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventInput {
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    pub priority_range: Priority,
    pub starting_date: DateTime<Utc>,
    pub ending_date: DateTime<Utc>,
}

/// Creates an event
///
/// # Errors
///
/// `Validation` if the name or owner is blank, or the event ends before it
/// starts.
pub async fn create_event(store: &dyn EntityStore, input: CreateEventInput) -> BoardResult<Event> {
    if input.owner_id.trim().is_empty() {
        return Err(BoardError::validation("owner_id is required"));
    }
    if input.name.trim().is_empty() {
        return Err(BoardError::validation("event name is required"));
    }

    let data = NewEvent {
        name: input.name.trim().to_string(),
        short_description: input.short_description,
        starting_date: input.starting_date,
        ending_date: input.ending_date,
        owner_id: input.owner_id,
        priority_range: input.priority_range,
    };
    if !data.has_valid_window() {
        return Err(BoardError::validation("starting_date must not be after ending_date"));
    }

    let event = Event::create(store, data).await?;
    tracing::info!(event_id = %event.id, owner_id = %event.owner_id, "Event created");
    Ok(event)
}

/// Fetches an event
pub async fn get_event(store: &dyn EntityStore, event_id: Uuid) -> BoardResult<Event> {
    Ok(Event::find_by_id(store, event_id).await?)
}

/// Events owned by a user, oldest first
pub async fn list_owned_events(store: &dyn EntityStore, owner_id: &str) -> BoardResult<Vec<Event>> {
    Ok(Event::list_by_owner(store, owner_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{memory::MemoryStore, Collection};
    use chrono::Duration;

    fn input(start: DateTime<Utc>, end: DateTime<Utc>) -> CreateEventInput {
        CreateEventInput {
            owner_id: "u1".to_string(),
            name: "Launch week".to_string(),
            short_description: String::new(),
            priority_range: Priority::High,
            starting_date: start,
            ending_date: end,
        }
    }

    #[tokio::test]
    async fn test_create_get_list() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let event = create_event(&store, input(now, now + Duration::days(7))).await.unwrap();

        assert_eq!(get_event(&store, event.id).await.unwrap(), event);
        assert_eq!(list_owned_events(&store, "u1").await.unwrap(), vec![event]);
        assert!(list_owned_events(&store, "u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inverted_window_rejected() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let err = create_event(&store, input(now, now - Duration::hours(1)))
            .await
            .unwrap_err();

        assert!(matches!(err, BoardError::Validation(_)));
        assert!(store.is_empty(Collection::Events));
    }

    #[tokio::test]
    async fn test_get_missing_event() {
        let store = MemoryStore::new();
        assert!(matches!(
            get_event(&store, Uuid::new_v4()).await,
            Err(BoardError::NotFound { entity: "event", .. })
        ));
    }
}
