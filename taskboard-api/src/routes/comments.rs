/// Comment thread endpoints
///
/// # Endpoints
///
/// - `POST /v1/comments/create` - Append a comment to a task
/// - `POST /v1/comments/list` - A task's comments, oldest first
///
/// Both require access to the task's project.

use crate::{app::AppState, error::ApiResult, extract::ValidJson, routes::StaleScopes};
use axum::{extract::State, Json};
use serde::Deserialize;
use taskboard_shared::{
    auth::{
        authorization::{require_actor, require_task_access},
        middleware::Session,
    },
    models::comment::Comment,
    services::comments,
    sync::Mutation,
};
use uuid::Uuid;
use validator::Validate;

/// Add comment request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,

    pub task_id: Uuid,

    #[validate(length(min = 1, max = 5000, message = "Comment must be 1-5000 characters"))]
    pub content: String,
}

/// Thread request
#[derive(Debug, Deserialize, Validate)]
pub struct ListCommentsRequest {
    pub task_id: Uuid,
}

pub async fn create_comment(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<CreateCommentRequest>,
) -> ApiResult<(StaleScopes, Json<Comment>)> {
    require_actor(&session, &req.user_id)?;
    require_task_access(state.store(), &session, req.task_id).await?;

    let comment = comments::add_comment(state.store(), &req.user_id, req.task_id, &req.content).await?;

    let mutation = Mutation::CommentAdded {
        task_id: comment.task_id,
    };
    Ok((StaleScopes::from(&mutation), Json(comment)))
}

pub async fn list_comments(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<ListCommentsRequest>,
) -> ApiResult<Json<Vec<Comment>>> {
    require_task_access(state.store(), &session, req.task_id).await?;

    let thread = comments::list_comments(state.store(), req.task_id).await?;
    Ok(Json(thread))
}
