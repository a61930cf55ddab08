/// Authorization checks
///
/// Checks apply to authenticated sessions. Anonymous sessions only reach
/// handlers when sessions are optional, and then pass every check.
///
/// # Permission Model
///
/// | Action | Allowed for |
/// |---|---|
/// | act as `user_id` / `owner_id` in a body | that user |
/// | remove a project | the project owner |
/// | read a project, its tasks or comments | the project owner or a member |
/// | create tasks or comment in a project | the project owner or a member |
/// | update, move or remove a task | the project owner or a member |
/// | same, once the project is removed | the task owner |
/// | leave a project | the membership's user |
///
/// Entities that do not exist are reported as `NotFound` before any
/// permission decision.

use uuid::Uuid;

use super::middleware::Session;
use crate::error::BoardError;
use crate::models::membership::Membership;
use crate::models::project::Project;
use crate::models::task::Task;
use crate::store::{EntityStore, StoreError};

/// Error type for authorization checks
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthzError {
    /// The session user differs from the actor named in the request
    #[error("Session user {session} cannot act as {actor}")]
    ActorMismatch { session: String, actor: String },

    /// The user doesn't own the project
    #[error("Only the project owner can do this")]
    NotProjectOwner(Uuid),

    /// The user is neither owner nor member
    #[error("Not a collaborator on project {0}")]
    NotCollaborator(Uuid),

    /// The membership belongs to someone else
    #[error("Membership belongs to another user")]
    NotMembershipHolder(Uuid),

    /// Lookup failed
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Checks the request's acting user against the session
pub fn require_actor(session: &Session, actor_id: &str) -> Result<(), AuthzError> {
    match session.user_id() {
        Some(user_id) if user_id != actor_id => Err(AuthzError::ActorMismatch {
            session: user_id.to_string(),
            actor: actor_id.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Whether `user_id` owns or has joined the project
pub async fn is_collaborator(
    store: &dyn EntityStore,
    project: &Project,
    user_id: &str,
) -> Result<bool, AuthzError> {
    if project.owner_id == user_id {
        return Ok(true);
    }
    Membership::has_access(store, user_id, project.id)
        .await
        .map_err(|e| AuthzError::Board(e.into()))
}

/// Loads a project the session user owns
pub async fn require_project_owner(
    store: &dyn EntityStore,
    session: &Session,
    project_id: Uuid,
) -> Result<Project, AuthzError> {
    let project = load_project(store, project_id).await?;

    match session.user_id() {
        Some(user_id) if project.owner_id != user_id => Err(AuthzError::NotProjectOwner(project_id)),
        _ => Ok(project),
    }
}

/// Loads a project the session user owns or has joined
pub async fn require_project_access(
    store: &dyn EntityStore,
    session: &Session,
    project_id: Uuid,
) -> Result<Project, AuthzError> {
    let project = load_project(store, project_id).await?;

    if let Some(user_id) = session.user_id() {
        if !is_collaborator(store, &project, user_id).await? {
            return Err(AuthzError::NotCollaborator(project_id));
        }
    }
    Ok(project)
}

/// Loads a task the session user may read or modify
///
/// Access follows the task's project, so leaving the project revokes it
/// even for tasks the user created. A task whose project was removed
/// remains accessible to its owner only.
pub async fn require_task_access(
    store: &dyn EntityStore,
    session: &Session,
    task_id: Uuid,
) -> Result<Task, AuthzError> {
    let task = Task::find_by_id(store, task_id)
        .await
        .map_err(|e| AuthzError::Board(e.into()))?;

    let Some(user_id) = session.user_id() else {
        return Ok(task);
    };

    let allowed = match Project::find_by_id(store, task.project_id).await {
        Ok(project) => is_collaborator(store, &project, user_id).await?,
        Err(StoreError::NotFound { .. }) => task.owner_id == user_id,
        Err(e) => return Err(AuthzError::Board(e.into())),
    };

    if allowed {
        Ok(task)
    } else {
        Err(AuthzError::NotCollaborator(task.project_id))
    }
}

/// Loads a membership held by the session user
pub async fn require_membership_holder(
    store: &dyn EntityStore,
    session: &Session,
    membership_id: Uuid,
) -> Result<Membership, AuthzError> {
    let membership = Membership::find_by_id(store, membership_id)
        .await
        .map_err(|e| AuthzError::Board(e.into()))?;

    match session.user_id() {
        Some(user_id) if membership.user_id != user_id => Err(AuthzError::NotMembershipHolder(membership_id)),
        _ => Ok(membership),
    }
}

async fn load_project(store: &dyn EntityStore, project_id: Uuid) -> Result<Project, AuthzError> {
    Project::find_by_id(store, project_id)
        .await
        .map_err(|e| AuthzError::Board(e.into()))
}
