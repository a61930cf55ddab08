/// User directory
///
/// Registration happens once per identity; lookups are by the identity
/// provider's user id.

use crate::error::{BoardError, BoardResult};
use crate::models::user::{CreateUser, User};
use crate::store::EntityStore;
use validator::ValidateEmail;

/// Registers a user
///
/// # Errors
///
/// - `Validation` if an identifying field is blank or the email is malformed
/// - `UniquenessConflict` if the identity id, email or phone is taken
pub async fn register_user(store: &dyn EntityStore, input: CreateUser) -> BoardResult<User> {
    for (field, value) in [
        ("user_id", &input.user_id),
        ("email", &input.email),
        ("phone", &input.phone),
        ("first_name", &input.first_name),
    ] {
        if value.trim().is_empty() {
            return Err(BoardError::validation(format!("{} is required", field)));
        }
    }
    if !input.email.validate_email() {
        return Err(BoardError::validation("email is not valid"));
    }

    let user = User::create(store, input).await?;
    tracing::info!(user_id = %user.user_id, "User registered");
    Ok(user)
}

/// Looks up a user by identity id
pub async fn get_user(store: &dyn EntityStore, user_id: &str) -> BoardResult<User> {
    User::find_by_user_id(store, user_id)
        .await?
        .ok_or_else(|| BoardError::not_found("user", user_id))
}
