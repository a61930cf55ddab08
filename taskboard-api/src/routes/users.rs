/// User directory endpoints
///
/// # Endpoints
///
/// - `POST /v1/users/create` - Register the session user
/// - `POST /v1/users/get` - Look up a user by identity id

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ValidJson,
    routes::StaleScopes,
};
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taskboard_shared::{
    auth::{authorization::require_actor, middleware::Session},
    models::user::{CreateUser, User},
    services::users,
    sync::Mutation,
};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Identity provider user id
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 32, message = "Phone must be 1-32 characters"))]
    pub phone: String,

    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    #[serde(default)]
    pub last_name: String,

    pub birthday: DateTime<Utc>,
}

/// Lookup request
#[derive(Debug, Deserialize, Validate)]
pub struct GetUserRequest {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
}

/// Registers a user
///
/// An authenticated session may only register itself.
pub async fn create_user(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<CreateUserRequest>,
) -> ApiResult<(StaleScopes, Json<User>)> {
    require_actor(&session, &req.user_id)?;

    let user = users::register_user(
        state.store(),
        CreateUser {
            user_id: req.user_id,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            birthday: req.birthday,
        },
    )
    .await?;

    let mutation = Mutation::UserRegistered {
        user_id: user.user_id.clone(),
    };
    Ok((StaleScopes::from(&mutation), Json(user)))
}

/// Looks up a user
pub async fn get_user(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<GetUserRequest>,
) -> ApiResult<Json<User>> {
    let user = users::get_user(state.store(), &req.user_id).await?;
    Ok(Json(user))
}
