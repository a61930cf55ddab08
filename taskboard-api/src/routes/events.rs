/// Event endpoints
///
/// # Endpoints
///
/// - `POST /v1/events/create` - Create an event
/// - `POST /v1/events/get` - Fetch an event
/// - `POST /v1/events/list` - Events owned by a user

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ValidJson,
    routes::{StaleScopes, TargetRequest},
};
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskboard_shared::{
    auth::{authorization::require_actor, middleware::Session},
    models::{event::Event, task::Priority},
    services::events::{self, CreateEventInput},
    sync::Mutation,
};
use validator::Validate;

/// Create event request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, message = "owner_id is required"))]
    pub owner_id: String,

    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    #[serde(default)]
    pub short_description: String,

    pub priority_range: Priority,

    pub starting_date: DateTime<Utc>,

    /// Must not precede `starting_date`
    pub ending_date: DateTime<Utc>,
}

/// Owned events request
#[derive(Debug, Deserialize, Validate)]
pub struct ListEventsRequest {
    #[validate(length(min = 1, message = "owner_id is required"))]
    pub owner_id: String,
}

pub async fn create_event(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<CreateEventRequest>,
) -> ApiResult<(StaleScopes, Json<Event>)> {
    require_actor(&session, &req.owner_id)?;

    let event = events::create_event(
        state.store(),
        CreateEventInput {
            owner_id: req.owner_id,
            name: req.name,
            short_description: req.short_description,
            priority_range: req.priority_range,
            starting_date: req.starting_date,
            ending_date: req.ending_date,
        },
    )
    .await?;

    let mutation = Mutation::EventCreated {
        event_id: event.id,
        owner_id: event.owner_id.clone(),
    };
    Ok((StaleScopes::from(&mutation), Json(event)))
}

pub async fn get_event(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<TargetRequest>,
) -> ApiResult<Json<Event>> {
    let event = events::get_event(state.store(), req.target_id).await?;
    Ok(Json(event))
}

pub async fn list_events(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<ListEventsRequest>,
) -> ApiResult<Json<Vec<Event>>> {
    require_actor(&session, &req.owner_id)?;

    let events = events::list_owned_events(state.store(), &req.owner_id).await?;
    Ok(Json(events))
}
