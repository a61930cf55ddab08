/// Service-level error taxonomy
///
/// Every board operation returns [`BoardResult`]. Store failures are folded in
/// through `From<StoreError>` so services can use `?` on store calls; the
/// initiating service handles the cases it can recover from (enrollment code
/// collisions) before they reach this type.

use crate::store::{Collection, StoreError};
use uuid::Uuid;

/// Result type for board operations
pub type BoardResult<T> = Result<T, BoardError>;

/// Errors surfaced by board services
#[derive(Debug, Clone, thiserror::Error)]
pub enum BoardError {
    /// Malformed or insufficient input; never retried
    #[error("validation failed: {0}")]
    Validation(String),

    /// A unique value is already taken
    #[error("{collection}.{field} is already taken")]
    UniquenessConflict { collection: Collection, field: String },

    /// The user already belongs to the project
    #[error("user {user_id} is already a member of project {project_id}")]
    AlreadyMember { user_id: String, project_id: Uuid },

    /// A referenced entity does not exist
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Retries against a uniqueness constraint were exhausted
    #[error("could not allocate a unique {what} after {attempts} attempts")]
    CapacityExhausted { what: &'static str, attempts: u32 },

    /// The store failed unexpectedly
    #[error("store failure: {0}")]
    Transport(String),
}

impl BoardError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        BoardError::Validation(message.into())
    }

    /// Shorthand for a missing entity
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        BoardError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// Singular entity name for a collection, used in error messages
fn entity_name(collection: Collection) -> &'static str {
    match collection {
        Collection::Users => "user",
        Collection::Projects => "project",
        Collection::Memberships => "membership",
        Collection::Tasks => "task",
        Collection::Events => "event",
        Collection::Comments => "comment",
    }
}

impl From<StoreError> for BoardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Uniqueness { collection, fields } => BoardError::UniquenessConflict {
                collection,
                field: fields.join("+"),
            },
            StoreError::NotFound { collection, id } => BoardError::not_found(entity_name(collection), id),
            StoreError::Transport(e) => BoardError::Transport(e.to_string()),
            StoreError::Serialization(msg) => BoardError::Transport(msg),
        }
    }
}
