/// Membership service
///
/// Owns the project-sharing protocol: issuing enrollment codes when a project
/// is created, redeeming them to join, and leaving.
///
/// # Enrollment codes
///
/// A code is two groups of four characters over `A-Z0-9` joined by a hyphen,
/// e.g. `AB12-CD34`. Each slot is an independent uniform draw. Generation does
/// not guarantee uniqueness; the store's unique constraint on
/// `projects.enrollment_id` does, and [`create_project`] redraws on conflict.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::services::membership;
/// use taskboard_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
///
/// let project = membership::create_project(&store, "u1", "Website", "Relaunch").await?;
/// let joined = membership::join_project(&store, &project.enrollment_id, "u2").await?;
/// assert_eq!(joined.project_id, project.id);
/// # Ok(())
/// # }
/// ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{BoardError, BoardResult};
use crate::models::membership::{CreateMembership, Membership};
use crate::models::project::{NewProject, Project};
use crate::store::{EntityStore, StoreError};

/// Characters allowed in an enrollment code slot
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Characters per group
pub const CODE_GROUP_LEN: usize = 4;

/// Attempts made by [`create_project`] before giving up
pub const MAX_CODE_ATTEMPTS: u32 = 5;

/// A well-formed enrollment code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnrollmentCode(String);

impl EnrollmentCode {
    /// Validates the `XXXX-XXXX` pattern
    pub fn parse(raw: &str) -> BoardResult<Self> {
        let bytes = raw.as_bytes();
        let well_formed = bytes.len() == CODE_GROUP_LEN * 2 + 1
            && bytes.iter().enumerate().all(|(i, b)| {
                if i == CODE_GROUP_LEN {
                    *b == b'-'
                } else {
                    CODE_ALPHABET.contains(b)
                }
            });

        if well_formed {
            Ok(Self(raw.to_string()))
        } else {
            Err(BoardError::validation(format!(
                "enrollment code '{}' does not match XXXX-XXXX",
                raw
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnrollmentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EnrollmentCode {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EnrollmentCode {
    type Error = BoardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EnrollmentCode> for String {
    fn from(code: EnrollmentCode) -> Self {
        code.0
    }
}

/// Draws an enrollment code from the given RNG
pub fn generate_enrollment_code_with<R: Rng>(rng: &mut R) -> EnrollmentCode {
    let mut draw = || -> String {
        (0..CODE_GROUP_LEN)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    };
    let first = draw();
    let second = draw();
    EnrollmentCode(format!("{}-{}", first, second))
}

/// Draws an enrollment code from the thread RNG
pub fn generate_enrollment_code() -> EnrollmentCode {
    generate_enrollment_code_with(&mut rand::thread_rng())
}

/// Creates a project owned by `owner_id` with a fresh enrollment code
///
/// # Errors
///
/// - `Validation` if the name or owner is blank
/// - `CapacityExhausted` if [`MAX_CODE_ATTEMPTS`] codes in a row collide
pub async fn create_project(
    store: &dyn EntityStore,
    owner_id: &str,
    name: &str,
    description: &str,
) -> BoardResult<Project> {
    create_project_with_codes(store, owner_id, name, description, generate_enrollment_code).await
}

/// [`create_project`] with an explicit code source
pub async fn create_project_with_codes<F>(
    store: &dyn EntityStore,
    owner_id: &str,
    name: &str,
    description: &str,
    mut next_code: F,
) -> BoardResult<Project>
where
    F: FnMut() -> EnrollmentCode + Send,
{
    if owner_id.trim().is_empty() {
        return Err(BoardError::validation("owner_id is required"));
    }
    if name.trim().is_empty() {
        return Err(BoardError::validation("project name is required"));
    }

    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = next_code();
        let input = NewProject {
            name: name.trim().to_string(),
            description: description.to_string(),
            owner_id: owner_id.to_string(),
            enrollment_id: code.to_string(),
        };

        match Project::create(store, input).await {
            Ok(project) => {
                tracing::info!(
                    project_id = %project.id,
                    owner_id = %owner_id,
                    attempt,
                    "Project created"
                );
                return Ok(project);
            }
            Err(err) if err.is_uniqueness_on("enrollment_id") => {
                tracing::warn!(code = %code, attempt, "Enrollment code collision, redrawing");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(BoardError::CapacityExhausted {
        what: "enrollment code",
        attempts: MAX_CODE_ATTEMPTS,
    })
}

/// Redeems an enrollment code for `user_id`
///
/// # Errors
///
/// - `NotFound` if no project holds the code, or the project disappears
///   before the membership is recorded (the membership is then removed)
/// - `AlreadyMember` if the user already belongs to the project
pub async fn join_project(
    store: &dyn EntityStore,
    enrollment_id: &str,
    user_id: &str,
) -> BoardResult<Membership> {
    if user_id.trim().is_empty() {
        return Err(BoardError::validation("user_id is required"));
    }

    let project = Project::find_by_enrollment_id(store, enrollment_id)
        .await?
        .ok_or_else(|| BoardError::not_found("project", enrollment_id))?;

    let already_member = || BoardError::AlreadyMember {
        user_id: user_id.to_string(),
        project_id: project.id,
    };

    if Membership::find(store, user_id, project.id).await?.is_some() {
        return Err(already_member());
    }

    let membership = Membership::create(
        store,
        CreateMembership {
            owner_id: project.owner_id.clone(),
            user_id: user_id.to_string(),
            project_id: project.id,
        },
    )
    .await
    .map_err(|err| match err {
        StoreError::Uniqueness { .. } => already_member(),
        other => other.into(),
    })?;

    match Project::find_by_id(store, project.id).await {
        Ok(_) => {}
        Err(StoreError::NotFound { .. }) => {
            tracing::warn!(
                project_id = %project.id,
                membership_id = %membership.id,
                "Project removed while joining, discarding membership"
            );
            Membership::delete(store, membership.id).await?;
            return Err(BoardError::not_found("project", enrollment_id));
        }
        Err(err) => return Err(err.into()),
    }

    tracing::info!(
        project_id = %project.id,
        user_id = %user_id,
        membership_id = %membership.id,
        "User joined project"
    );

    Ok(membership)
}

/// Deletes a membership, returning the removed record
///
/// The project and its tasks are untouched.
pub async fn leave_project(store: &dyn EntityStore, membership_id: Uuid) -> BoardResult<Membership> {
    let membership = Membership::delete(store, membership_id).await?;
    tracing::info!(
        project_id = %membership.project_id,
        user_id = %membership.user_id,
        "User left project"
    );
    Ok(membership)
}

/// Fetches a membership
pub async fn get_membership(store: &dyn EntityStore, membership_id: Uuid) -> BoardResult<Membership> {
    Ok(Membership::find_by_id(store, membership_id).await?)
}

/// A membership together with its project, when the project still exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedProject {
    pub membership: Membership,
    pub project: Option<Project>,
}

/// Projects owned by a user, oldest first
pub async fn list_owned_projects(store: &dyn EntityStore, owner_id: &str) -> BoardResult<Vec<Project>> {
    Ok(Project::list_by_owner(store, owner_id).await?)
}

/// Projects a user has joined, oldest membership first
///
/// Memberships whose project was removed are returned with `project: None`.
pub async fn list_joined_projects(store: &dyn EntityStore, user_id: &str) -> BoardResult<Vec<JoinedProject>> {
    let memberships = Membership::list_by_user(store, user_id).await?;
    let mut joined = Vec::with_capacity(memberships.len());

    for membership in memberships {
        let project = match Project::find_by_id(store, membership.project_id).await {
            Ok(project) => Some(project),
            Err(StoreError::NotFound { .. }) => None,
            Err(err) => return Err(err.into()),
        };
        joined.push(JoinedProject { membership, project });
    }

    Ok(joined)
}

/// Fetches a project
pub async fn get_project(store: &dyn EntityStore, project_id: Uuid) -> BoardResult<Project> {
    Ok(Project::find_by_id(store, project_id).await?)
}

/// Deletes a project, returning the removed record
///
/// Tasks and memberships of the project are left in place.
pub async fn remove_project(store: &dyn EntityStore, project_id: Uuid) -> BoardResult<Project> {
    let project = Project::delete(store, project_id).await?;
    tracing::info!(project_id = %project.id, owner_id = %project.owner_id, "Project removed");
    Ok(project)
}
