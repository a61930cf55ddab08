/// Project and membership endpoints
///
/// # Endpoints
///
/// - `POST /v1/projects/create` - Create a project with a fresh enrollment code
/// - `POST /v1/projects/get` - Fetch a project
/// - `POST /v1/projects/list` - Projects owned by a user
/// - `POST /v1/projects/joined` - Projects a user joined, with their memberships
/// - `POST /v1/projects/join` - Redeem an enrollment code
/// - `POST /v1/projects/leave` - Delete a membership
/// - `POST /v1/projects/remove` - Delete a project (owner only)
///
/// Removing a project leaves its tasks and memberships in place. A project
/// is readable by its owner and members; listings only by the user they
/// belong to.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ValidJson,
    routes::{StaleScopes, TargetRequest},
};
use axum::{extract::State, Json};
use serde::Deserialize;
use taskboard_shared::{
    auth::{
        authorization::{
            require_actor, require_membership_holder, require_project_access, require_project_owner,
        },
        middleware::Session,
    },
    error::BoardError,
    models::{membership::Membership, project::Project},
    services::membership::{self, EnrollmentCode, JoinedProject},
    sync::Mutation,
};
use uuid::Uuid;
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, message = "owner_id is required"))]
    pub owner_id: String,

    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    #[serde(default)]
    pub description: String,
}

/// Owned projects request
#[derive(Debug, Deserialize, Validate)]
pub struct ListProjectsRequest {
    #[validate(length(min = 1, message = "owner_id is required"))]
    pub owner_id: String,
}

/// Joined projects request
#[derive(Debug, Deserialize, Validate)]
pub struct JoinedProjectsRequest {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
}

/// Join request
#[derive(Debug, Deserialize, Validate)]
pub struct JoinProjectRequest {
    /// Enrollment code, `XXXX-XXXX`
    #[validate(length(min = 1, message = "enrollment_id is required"))]
    pub enrollment_id: String,

    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
}

/// Leave request
#[derive(Debug, Deserialize, Validate)]
pub struct LeaveProjectRequest {
    /// Membership id
    pub id: Uuid,
}

/// Remove request
#[derive(Debug, Deserialize, Validate)]
pub struct RemoveProjectRequest {
    pub project_id: Uuid,
}

/// Creates a project owned by `owner_id`
pub async fn create_project(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<CreateProjectRequest>,
) -> ApiResult<(StaleScopes, Json<Project>)> {
    require_actor(&session, &req.owner_id)?;

    let project = membership::create_project(state.store(), &req.owner_id, &req.name, &req.description).await?;

    let mutation = Mutation::ProjectCreated {
        project_id: project.id,
        owner_id: project.owner_id.clone(),
    };
    Ok((StaleScopes::from(&mutation), Json(project)))
}

/// Fetches a project the caller owns or has joined
pub async fn get_project(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<TargetRequest>,
) -> ApiResult<Json<Project>> {
    let project = require_project_access(state.store(), &session, req.target_id).await?;
    Ok(Json(project))
}

/// Lists projects owned by a user
pub async fn list_projects(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<ListProjectsRequest>,
) -> ApiResult<Json<Vec<Project>>> {
    require_actor(&session, &req.owner_id)?;

    let projects = membership::list_owned_projects(state.store(), &req.owner_id).await?;
    Ok(Json(projects))
}

/// Lists projects a user joined
pub async fn list_joined(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<JoinedProjectsRequest>,
) -> ApiResult<Json<Vec<JoinedProject>>> {
    require_actor(&session, &req.user_id)?;

    let joined = membership::list_joined_projects(state.store(), &req.user_id).await?;
    Ok(Json(joined))
}

/// Redeems an enrollment code
///
/// The code is matched after normalizing case and surrounding whitespace;
/// anything that cannot be a code is reported as an unknown project.
pub async fn join_project(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<JoinProjectRequest>,
) -> ApiResult<(StaleScopes, Json<Membership>)> {
    require_actor(&session, &req.user_id)?;

    let code = EnrollmentCode::parse(&req.enrollment_id.trim().to_ascii_uppercase())
        .map(String::from)
        .unwrap_or(req.enrollment_id);

    let joined = membership::join_project(state.store(), &code, &req.user_id).await?;

    let mutation = Mutation::ProjectJoined {
        project_id: joined.project_id,
        user_id: joined.user_id.clone(),
    };
    Ok((StaleScopes::from(&mutation), Json(joined)))
}

/// Leaves a project by deleting the caller's membership
pub async fn leave_project(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<LeaveProjectRequest>,
) -> ApiResult<(StaleScopes, Json<Membership>)> {
    require_membership_holder(state.store(), &session, req.id).await?;

    let left = membership::leave_project(state.store(), req.id).await?;

    let mutation = Mutation::ProjectLeft {
        project_id: left.project_id,
        user_id: left.user_id.clone(),
    };
    Ok((StaleScopes::from(&mutation), Json(left)))
}

/// Removes a project
pub async fn remove_project(
    State(state): State<AppState>,
    session: Session,
    ValidJson(req): ValidJson<RemoveProjectRequest>,
) -> ApiResult<(StaleScopes, Json<Project>)> {
    require_project_owner(state.store(), &session, req.project_id).await?;

    let member_ids: Vec<String> = Membership::list_by_project(state.store(), req.project_id)
        .await
        .map_err(BoardError::from)?
        .into_iter()
        .map(|m| m.user_id)
        .collect();

    let removed = membership::remove_project(state.store(), req.project_id).await?;

    let mutation = Mutation::ProjectRemoved {
        project_id: removed.id,
        owner_id: removed.owner_id.clone(),
        member_ids,
    };
    Ok((StaleScopes::from(&mutation), Json(removed)))
}
