/// Membership model and store operations
///
/// A membership ("joined project") grants one user collaborator access to one
/// project. It is created by redeeming the project's enrollment code and
/// deleted when the member leaves.
///
/// # Collection
///
/// `memberships`, unique on the pair (`user_id`, `project_id`).
///
/// `owner_id` is copied from the project at join time so a member's project
/// list can show the owner without another lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{to_fields, Collection, EntityStore, Filter, StoreResult};

/// A user's membership in a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    /// Store record id
    pub id: Uuid,

    /// Owner of the joined project (denormalized)
    pub owner_id: String,

    /// The member
    pub user_id: String,

    /// The joined project
    pub project_id: Uuid,

    /// When the user joined
    pub created_at: DateTime<Utc>,
}

/// Input for creating a membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    pub owner_id: String,
    pub user_id: String,
    pub project_id: Uuid,
}

impl Membership {
    /// Creates a membership
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Uniqueness` if the user already belongs to the
    /// project.
    pub async fn create(store: &dyn EntityStore, data: CreateMembership) -> StoreResult<Self> {
        store
            .create(Collection::Memberships, to_fields(&data)?)
            .await?
            .into_record()
    }

    /// Fetches a membership by id
    pub async fn find_by_id(store: &dyn EntityStore, id: Uuid) -> StoreResult<Self> {
        store.get(Collection::Memberships, id).await?.into_record()
    }

    /// Finds the membership of a user in a project
    pub async fn find(
        store: &dyn EntityStore,
        user_id: &str,
        project_id: Uuid,
    ) -> StoreResult<Option<Self>> {
        store
            .find_first(
                Collection::Memberships,
                Filter::new()
                    .eq("user_id", user_id)
                    .eq("project_id", project_id.to_string()),
            )
            .await?
            .map(|doc| doc.into_record())
            .transpose()
    }

    /// Lists a user's memberships, oldest first
    pub async fn list_by_user(store: &dyn EntityStore, user_id: &str) -> StoreResult<Vec<Self>> {
        store
            .filter_all(Collection::Memberships, Filter::new().eq("user_id", user_id))
            .await?
            .into_iter()
            .map(|doc| doc.into_record())
            .collect()
    }

    /// Lists the members of a project
    pub async fn list_by_project(store: &dyn EntityStore, project_id: Uuid) -> StoreResult<Vec<Self>> {
        store
            .filter_all(
                Collection::Memberships,
                Filter::new().eq("project_id", project_id.to_string()),
            )
            .await?
            .into_iter()
            .map(|doc| doc.into_record())
            .collect()
    }

    /// Whether a user is a member of a project
    pub async fn has_access(store: &dyn EntityStore, user_id: &str, project_id: Uuid) -> StoreResult<bool> {
        Ok(Self::find(store, user_id, project_id).await?.is_some())
    }

    /// Deletes a membership, returning the removed record
    pub async fn delete(store: &dyn EntityStore, id: Uuid) -> StoreResult<Self> {
        store.delete(Collection::Memberships, id).await?.into_record()
    }
}
