/// User model
///
/// Users are registered once, after the identity provider has issued them an
/// opaque `user_id`. The board never deletes them.
///
/// # Collection
///
/// `users`, unique on `user_id`, `email` and `phone` (each independently).
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{CreateUser, User};
/// use taskboard_shared::store::memory::MemoryStore;
/// use chrono::Utc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let user = User::create(&store, CreateUser {
///     user_id: "idp|42".to_string(),
///     first_name: "Ada".to_string(),
///     last_name: "Lovelace".to_string(),
///     email: "ada@example.com".to_string(),
///     phone: "+44 20 7946 0000".to_string(),
///     birthday: Utc::now(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{to_fields, Collection, EntityStore, Filter, StoreResult};

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Store record id
    pub id: Uuid,

    /// External identity id issued by the identity provider
    pub user_id: String,

    pub first_name: String,

    pub last_name: String,

    /// Unique across users
    pub email: String,

    /// Unique across users
    pub phone: String,

    pub birthday: DateTime<Utc>,

    /// When the user registered
    pub created_at: DateTime<Utc>,
}

/// Input for registering a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birthday: DateTime<Utc>,
}

impl User {
    /// Registers a new user
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Uniqueness` if the identity id, email or phone
    /// is already registered.
    pub async fn create(store: &dyn EntityStore, data: CreateUser) -> StoreResult<Self> {
        store
            .create(Collection::Users, to_fields(&data)?)
            .await?
            .into_record()
    }

    /// Finds a user by external identity id
    pub async fn find_by_user_id(store: &dyn EntityStore, user_id: &str) -> StoreResult<Option<Self>> {
        store
            .find_first(Collection::Users, Filter::new().eq("user_id", user_id))
            .await?
            .map(|doc| doc.into_record())
            .transpose()
    }

    /// Display name, "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
