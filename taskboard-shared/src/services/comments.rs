/// Comment thread service
///
/// Per-task discussion. Comments can be added and listed, never edited or
/// deleted.

use uuid::Uuid;

use crate::error::{BoardError, BoardResult};
use crate::models::comment::{Comment, NewComment};
use crate::models::task::Task;
use crate::store::{EntityStore, StoreError};

/// Appends a comment to a task
///
/// # Errors
///
/// - `Validation` if the author or content is blank
/// - `NotFound` if the task does not exist
pub async fn add_comment(
    store: &dyn EntityStore,
    user_id: &str,
    task_id: Uuid,
    content: &str,
) -> BoardResult<Comment> {
    if user_id.trim().is_empty() {
        return Err(BoardError::validation("user_id is required"));
    }
    if content.trim().is_empty() {
        return Err(BoardError::validation("comment content is required"));
    }

    match Task::find_by_id(store, task_id).await {
        Ok(_) => {}
        Err(StoreError::NotFound { .. }) => return Err(BoardError::not_found("task", task_id)),
        Err(err) => return Err(err.into()),
    }

    let comment = Comment::create(
        store,
        NewComment {
            user_id: user_id.to_string(),
            task_id,
            content: content.to_string(),
        },
    )
    .await?;

    tracing::debug!(comment_id = %comment.id, task_id = %task_id, "Comment added");
    Ok(comment)
}

/// Comments of a task, oldest first
///
/// Ties on `created_at` keep store order.
pub async fn list_comments(store: &dyn EntityStore, task_id: Uuid) -> BoardResult<Vec<Comment>> {
    let mut comments = Comment::list_by_task(store, task_id).await?;
    comments.sort_by_key(|comment| comment.created_at);
    Ok(comments)
}
