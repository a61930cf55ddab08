/// Task lifecycle engine
///
/// Creation, partial update, deletion and drag-and-drop moves of task cards.
/// Status rules live on [`TaskStatus`]; this module enforces the input
/// guards around them.
///
/// # Drag and drop
///
/// A board shows one column per status. Dropping a card carries only the
/// task id; [`drop_request`] turns `(task id, column)` into the equivalent
/// update, and [`apply_drop`] skips the write when the card is already in
/// that column.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{BoardError, BoardResult};
use crate::models::project::Project;
use crate::models::task::{NewTask, Priority, Task, TaskPatch, TaskStatus, Transition};
use crate::store::{EntityStore, StoreError};

/// Input for [`create_task`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskInput {
    pub owner_id: String,
    pub project_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    pub priority_range: Priority,
}

/// Creates a task in `pending`
///
/// # Errors
///
/// - `Validation` if the name or owner is blank
/// - `NotFound` if the project does not exist
pub async fn create_task(store: &dyn EntityStore, input: CreateTaskInput) -> BoardResult<Task> {
    if input.owner_id.trim().is_empty() {
        return Err(BoardError::validation("owner_id is required"));
    }
    if input.name.trim().is_empty() {
        return Err(BoardError::validation("task name is required"));
    }

    match Project::find_by_id(store, input.project_id).await {
        Ok(_) => {}
        Err(StoreError::NotFound { .. }) => {
            return Err(BoardError::not_found("project", input.project_id));
        }
        Err(err) => return Err(err.into()),
    }

    let task = Task::create(
        store,
        NewTask {
            name: input.name.trim().to_string(),
            short_description: input.short_description,
            status: TaskStatus::Pending,
            priority_range: input.priority_range,
            owner_id: input.owner_id,
            project_id: input.project_id,
        },
    )
    .await?;

    tracing::info!(task_id = %task.id, project_id = %task.project_id, "Task created");
    Ok(task)
}

/// Fetches a task
pub async fn get_task(store: &dyn EntityStore, task_id: Uuid) -> BoardResult<Task> {
    Ok(Task::find_by_id(store, task_id).await?)
}

/// Tasks of a project, oldest first
pub async fn list_tasks(store: &dyn EntityStore, project_id: Uuid) -> BoardResult<Vec<Task>> {
    Ok(Task::list_by_project(store, project_id).await?)
}

/// Applies a partial update
///
/// Blank strings count as omitted. A patch with nothing left is rejected
/// before the store is touched.
///
/// # Errors
///
/// - `Validation` if the patch is empty
/// - `NotFound` if the task does not exist
pub async fn update_task(store: &dyn EntityStore, task_id: Uuid, patch: TaskPatch) -> BoardResult<Task> {
    let patch = patch.normalized();
    if patch.is_empty() {
        return Err(BoardError::validation("at least one field must be provided"));
    }

    let task = Task::update(store, task_id, &patch).await?;

    tracing::debug!(
        task_id = %task.id,
        status = %task.status,
        "Task updated"
    );
    Ok(task)
}

/// Sets a task's status
///
/// Moving to the current status performs no write and returns the task as
/// stored.
pub async fn set_status(store: &dyn EntityStore, task_id: Uuid, status: TaskStatus) -> BoardResult<Task> {
    let task = get_task(store, task_id).await?;

    match task.status.transition_to(status) {
        Transition::Unchanged => Ok(task),
        Transition::Changed { from, to } => {
            if !from.can_transition_to(to) {
                return Err(BoardError::validation(format!(
                    "cannot move task from {} to {}",
                    from, to
                )));
            }
            let updated = update_task(store, task_id, TaskPatch::status(to)).await?;
            tracing::info!(task_id = %task_id, from = %from, to = %to, "Task moved");
            Ok(updated)
        }
    }
}

/// Groups a task under an event
///
/// Only `event_id` is written. The event is not checked against the task's
/// project or owner.
pub async fn assign_event(store: &dyn EntityStore, task_id: Uuid, event_id: Uuid) -> BoardResult<Task> {
    update_task(store, task_id, TaskPatch::event(event_id)).await
}

/// Deletes a task, returning the removed record
pub async fn delete_task(store: &dyn EntityStore, task_id: Uuid) -> BoardResult<Task> {
    let task = Task::delete(store, task_id).await?;
    tracing::info!(task_id = %task.id, project_id = %task.project_id, "Task deleted");
    Ok(task)
}

/// A board column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardColumn {
    Pending,
    Ongoing,
    Done,
    Dropped,
    Cancelled,
}

impl BoardColumn {
    /// Columns in display order
    pub const ALL: [BoardColumn; 5] = [
        BoardColumn::Pending,
        BoardColumn::Ongoing,
        BoardColumn::Done,
        BoardColumn::Dropped,
        BoardColumn::Cancelled,
    ];

    /// Status assigned to cards dropped here
    pub fn status(&self) -> TaskStatus {
        match self {
            BoardColumn::Pending => TaskStatus::Pending,
            BoardColumn::Ongoing => TaskStatus::Ongoing,
            BoardColumn::Done => TaskStatus::Done,
            BoardColumn::Dropped => TaskStatus::Dropped,
            BoardColumn::Cancelled => TaskStatus::Cancelled,
        }
    }

    /// Column holding cards of `status`
    pub fn for_status(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending => BoardColumn::Pending,
            TaskStatus::Ongoing => BoardColumn::Ongoing,
            TaskStatus::Done => BoardColumn::Done,
            TaskStatus::Dropped => BoardColumn::Dropped,
            TaskStatus::Cancelled => BoardColumn::Cancelled,
        }
    }

    /// Column heading
    pub fn label(&self) -> &'static str {
        match self {
            BoardColumn::Pending => "Pending",
            BoardColumn::Ongoing => "Ongoing",
            BoardColumn::Done => "Done",
            BoardColumn::Dropped => "Dropped",
            BoardColumn::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for BoardColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BoardColumn {
    type Err = BoardError;

    /// Accepts either the status value or the heading, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        BoardColumn::ALL
            .into_iter()
            .find(|column| column.status().as_str() == wanted)
            .ok_or_else(|| BoardError::validation(format!("unknown board column '{}'", s)))
    }
}

/// A card dropped onto a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropEvent {
    /// Transfer payload: the dragged task's id
    pub task_id: Uuid,
    pub target: BoardColumn,
}

/// Maps a drop to the update it stands for
pub fn drop_request(event: DropEvent) -> (Uuid, TaskPatch) {
    (event.task_id, TaskPatch::status(event.target.status()))
}

/// Applies a drop
///
/// Returns the task unchanged, without writing, when it already sits in the
/// target column.
pub async fn apply_drop(store: &dyn EntityStore, event: DropEvent) -> BoardResult<Task> {
    let task = get_task(store, event.task_id).await?;
    if BoardColumn::for_status(task.status) == event.target {
        return Ok(task);
    }

    let (task_id, patch) = drop_request(event);
    let updated = update_task(store, task_id, patch).await?;
    tracing::info!(
        task_id = %task_id,
        from = %task.status,
        to = %updated.status,
        "Task dropped on column"
    );
    Ok(updated)
}
