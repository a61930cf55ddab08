/// Project model and store operations
///
/// A project is owned by one user and shared with collaborators through its
/// enrollment code. The code is assigned at creation and never changes.
///
/// # Collection
///
/// `projects`, unique on `enrollment_id`.
///
/// Deleting a project does not delete its tasks or memberships; those rows
/// are left in place and simply stop resolving to a project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{to_fields, Collection, EntityStore, Filter, StoreResult};

/// A project board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Store record id
    pub id: Uuid,

    /// Project name
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Identity id of the owner
    pub owner_id: String,

    /// Share code in `XXXX-XXXX` form
    pub enrollment_id: String,

    /// When the project was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a project
///
/// The enrollment code is chosen by the membership service, not the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub enrollment_id: String,
}

impl Project {
    /// Inserts a project
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Uniqueness` on `enrollment_id` when the code is
    /// already in use; the caller should draw a new code and retry.
    pub async fn create(store: &dyn EntityStore, data: NewProject) -> StoreResult<Self> {
        store
            .create(Collection::Projects, to_fields(&data)?)
            .await?
            .into_record()
    }

    /// Fetches a project by id
    pub async fn find_by_id(store: &dyn EntityStore, id: Uuid) -> StoreResult<Self> {
        store.get(Collection::Projects, id).await?.into_record()
    }

    /// Finds the project holding an enrollment code (exact match)
    pub async fn find_by_enrollment_id(
        store: &dyn EntityStore,
        enrollment_id: &str,
    ) -> StoreResult<Option<Self>> {
        store
            .find_first(
                Collection::Projects,
                Filter::new().eq("enrollment_id", enrollment_id),
            )
            .await?
            .map(|doc| doc.into_record())
            .transpose()
    }

    /// Lists projects owned by a user, oldest first
    pub async fn list_by_owner(store: &dyn EntityStore, owner_id: &str) -> StoreResult<Vec<Self>> {
        store
            .filter_all(Collection::Projects, Filter::new().eq("owner_id", owner_id))
            .await?
            .into_iter()
            .map(|doc| doc.into_record())
            .collect()
    }

    /// Deletes a project, returning the removed record
    pub async fn delete(store: &dyn EntityStore, id: Uuid) -> StoreResult<Self> {
        store.delete(Collection::Projects, id).await?.into_record()
    }
}
