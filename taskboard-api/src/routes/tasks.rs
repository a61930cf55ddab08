/// Task lifecycle endpoints
///
/// # Endpoints
///
/// - `POST /v1/tasks/create` - Create a task in `pending`
/// - `POST /v1/tasks/list` - Tasks of a project
/// - `POST /v1/tasks/update` - Partial update; blank fields are ignored
/// - `POST /v1/tasks/drop` - Move a card to a board column
/// - `POST /v1/tasks/assign_event` - Group a task under an event
/// - `POST /v1/tasks/remove` - Delete a task
///
/// Every write invalidates the project's `tasks:` scope.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ValidJson,
    routes::{StaleScopes, TargetRequest},
};
use axum::{extract::State, Json};
use serde::Deserialize;
use taskboard_shared::{
    auth::{
        authorization::{require_actor, require_project_access, require_task_access},
        middleware::Session,
    },
    models::task::{Priority, Task, TaskPatch},
    services::{
        events,
        lifecycle::{self, BoardColumn, CreateTaskInput, DropEvent},
    },
    sync::Mutation,
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, message = "owner_id is required"))]
    pub owner_id: String,

    pub project_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    #[serde(default)]
    pub short_description: String,

    /// `"1"`, `"5"` or `"10"`
    pub priority_range: Priority,
}

/// Project tasks request
#[derive(Debug, Deserialize, Validate)]
pub struct ListTasksRequest {
    pub project_id: Uuid,
}

/// Partial update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    pub target_id: Uuid,

    /// Fields to change
    #[serde(default)]
    pub content: TaskPatch,
}

/// Drag-and-drop request
#[derive(Debug, Deserialize, Validate)]
pub struct DropTaskRequest {
    /// Dragged task
    pub target_id: Uuid,

    /// Column the card was dropped on, by status or heading
    #[validate(length(min = 1, message = "column is required"))]
    pub column: String,
}

/// Assign event request
#[derive(Debug, Deserialize, Validate)]
pub struct AssignEventRequest {
    pub target_id: Uuid,
    pub event_id: Uuid,
}

fn changed(task: &Task) -> StaleScopes {
    StaleScopes::from(&Mutation::TaskChanged {
        task_id: task.id,
        project_id: task.project_id,
    })
}

/// Creates a task
///
/// The session user must own or have joined the project.
pub async fn create_task(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<CreateTaskRequest>,
) -> ApiResult<(StaleScopes, Json<Task>)> {
    require_actor(&session, &req.owner_id)?;
    require_project_access(state.store(), &session, req.project_id).await?;

    let task = lifecycle::create_task(
        state.store(),
        CreateTaskInput {
            owner_id: req.owner_id,
            project_id: req.project_id,
            name: req.name,
            short_description: req.short_description,
            priority_range: req.priority_range,
        },
    )
    .await?;

    Ok((changed(&task), Json(task)))
}

/// Lists a project's tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<ListTasksRequest>,
) -> ApiResult<Json<Vec<Task>>> {
    require_project_access(state.store(), &session, req.project_id).await?;

    let tasks = lifecycle::list_tasks(state.store(), req.project_id).await?;
    Ok(Json(tasks))
}

/// Applies a partial update
pub async fn update_task(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<UpdateTaskRequest>,
) -> ApiResult<(StaleScopes, Json<Task>)> {
    require_task_access(state.store(), &session, req.target_id).await?;

    let task = lifecycle::update_task(state.store(), req.target_id, req.content).await?;
    Ok((changed(&task), Json(task)))
}

/// Moves a card to the column it was dropped on
pub async fn drop_task(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<DropTaskRequest>,
) -> ApiResult<(StaleScopes, Json<Task>)> {
    let target: BoardColumn = req.column.parse()?;
    require_task_access(state.store(), &session, req.target_id).await?;

    let task = lifecycle::apply_drop(
        state.store(),
        DropEvent {
            task_id: req.target_id,
            target,
        },
    )
    .await?;

    Ok((changed(&task), Json(task)))
}

/// Groups a task under an existing event
pub async fn assign_event(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<AssignEventRequest>,
) -> ApiResult<(StaleScopes, Json<Task>)> {
    require_task_access(state.store(), &session, req.target_id).await?;
    events::get_event(state.store(), req.event_id).await?;

    let task = lifecycle::assign_event(state.store(), req.target_id, req.event_id).await?;
    Ok((changed(&task), Json(task)))
}

/// Deletes a task
pub async fn remove_task(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<TargetRequest>,
) -> ApiResult<(StaleScopes, Json<Task>)> {
    require_task_access(state.store(), &session, req.target_id).await?;

    let task = lifecycle::delete_task(state.store(), req.target_id).await?;

    let mutation = Mutation::TaskRemoved {
        task_id: task.id,
        project_id: task.project_id,
    };
    Ok((StaleScopes::from(&mutation), Json(task)))
}
