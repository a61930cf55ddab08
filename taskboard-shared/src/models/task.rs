/// Task model and store operations
///
/// Tasks are the cards on a project board. Every task belongs to exactly one
/// project and may be grouped under an event.
///
/// # State Machine
///
/// ```text
///            ┌──────────┐
///   create → │ pending  │ ←──────────────┐
///            └──────────┘                │
///   any of {pending, ongoing, done, cancelled, dropped}
///   may move to any other; moving to the current state is a no-op
/// ```
///
/// Transitions come from edit-form submissions or from dropping a card on a
/// board column (see `services::lifecycle`).
///
/// # Collection
///
/// `tasks`, no unique constraints.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::store::{to_fields, Collection, EntityStore, Filter, StoreResult};

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not started; every task starts here
    Pending,

    /// In progress
    Ongoing,

    /// Finished
    Done,

    /// Called off before completion
    Cancelled,

    /// Abandoned
    Dropped,
}

/// Outcome of applying a status to a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The task already had the target status
    Unchanged,

    /// The status changes from one value to another
    Changed { from: TaskStatus, to: TaskStatus },
}

impl TaskStatus {
    /// Every status, in board column order
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::Ongoing,
        TaskStatus::Done,
        TaskStatus::Dropped,
        TaskStatus::Cancelled,
    ];

    /// Converts status to its stored string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Ongoing => "ongoing",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Dropped => "dropped",
        }
    }

    /// Whether a task in this status may move to `target`
    ///
    /// The workflow is deliberately unrestricted: every pair is allowed.
    pub fn can_transition_to(&self, _target: TaskStatus) -> bool {
        true
    }

    /// Classifies a move to `target`
    pub fn transition_to(&self, target: TaskStatus) -> Transition {
        if *self == target {
            Transition::Unchanged
        } else {
            Transition::Changed {
                from: *self,
                to: target,
            }
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseTaskStatusError(s.to_string()))
    }
}

/// Priority tier, stored as its weight `"1"`, `"5"` or `"10"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Numeric weight of the tier
    pub fn weight(&self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 5,
            Priority::High => 10,
        }
    }

    /// Parses a weight back into a tier
    pub fn from_weight(weight: u64) -> Option<Self> {
        match weight {
            1 => Some(Priority::Low),
            5 => Some(Priority::Medium),
            10 => Some(Priority::High),
            _ => None,
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.weight().to_string())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        let weight = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n,
            Raw::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| D::Error::custom(format!("invalid priority '{}'", s)))?,
        };

        Priority::from_weight(weight)
            .ok_or_else(|| D::Error::custom(format!("invalid priority {}, expected 1, 5 or 10", weight)))
    }
}

/// A task card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Store record id
    pub id: Uuid,

    pub name: String,

    #[serde(default)]
    pub short_description: String,

    pub status: TaskStatus,

    pub priority_range: Priority,

    /// Identity id of the creator
    pub owner_id: String,

    /// Owning project
    pub project_id: Uuid,

    /// Optional event grouping
    #[serde(default)]
    pub event_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
}

/// Input for inserting a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub short_description: String,
    pub status: TaskStatus,
    pub priority_range: Priority,
    pub owner_id: String,
    pub project_id: Uuid,
}

/// Partial task update
///
/// Only fields that are `Some` are written. When deserializing, `null`,
/// missing and blank-string values all count as omitted, so a form that
/// submits empty inputs does not overwrite anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub priority_range: Option<Priority>,

    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    use serde::de::Error;

    match Option::<JsonValue>::deserialize(deserializer)? {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some).map_err(D::Error::custom),
    }
}

impl TaskPatch {
    /// A patch that only sets the status
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// A patch that only sets the event
    pub fn event(event_id: Uuid) -> Self {
        Self {
            event_id: Some(event_id),
            ..Self::default()
        }
    }

    /// Drops string fields that are blank after trimming
    pub fn normalized(mut self) -> Self {
        self.name = self.name.filter(|s| !s.trim().is_empty());
        self.short_description = self.short_description.filter(|s| !s.trim().is_empty());
        self
    }

    /// Whether the patch would change nothing
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.short_description.is_none()
            && self.status.is_none()
            && self.priority_range.is_none()
            && self.event_id.is_none()
    }
}

impl Task {
    /// Inserts a task
    pub async fn create(store: &dyn EntityStore, data: NewTask) -> StoreResult<Self> {
        store
            .create(Collection::Tasks, to_fields(&data)?)
            .await?
            .into_record()
    }

    /// Fetches a task by id
    pub async fn find_by_id(store: &dyn EntityStore, id: Uuid) -> StoreResult<Self> {
        store.get(Collection::Tasks, id).await?.into_record()
    }

    /// Lists the tasks of a project, oldest first
    pub async fn list_by_project(store: &dyn EntityStore, project_id: Uuid) -> StoreResult<Vec<Self>> {
        store
            .filter_all(
                Collection::Tasks,
                Filter::new().eq("project_id", project_id.to_string()),
            )
            .await?
            .into_iter()
            .map(|doc| doc.into_record())
            .collect()
    }

    /// Writes the `Some` fields of a patch
    pub async fn update(store: &dyn EntityStore, id: Uuid, patch: &TaskPatch) -> StoreResult<Self> {
        store
            .update(Collection::Tasks, id, to_fields(patch)?)
            .await?
            .into_record()
    }

    /// Deletes a task, returning the removed record
    pub async fn delete(store: &dyn EntityStore, id: Uuid) -> StoreResult<Self> {
        store.delete(Collection::Tasks, id).await?.into_record()
    }
}
