/// Mutation to scope mapping
///
/// Every successful write is described by a [`Mutation`]; [`affected_scopes`]
/// lists the scopes whose cached view it invalidates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scope::ScopeKey;

/// A successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    UserRegistered {
        user_id: String,
    },
    ProjectCreated {
        project_id: Uuid,
        owner_id: String,
    },
    /// `member_ids` are the users whose joined list showed the project
    ProjectRemoved {
        project_id: Uuid,
        owner_id: String,
        member_ids: Vec<String>,
    },
    ProjectJoined {
        project_id: Uuid,
        user_id: String,
    },
    ProjectLeft {
        project_id: Uuid,
        user_id: String,
    },
    /// Task created or updated
    TaskChanged {
        task_id: Uuid,
        project_id: Uuid,
    },
    TaskRemoved {
        task_id: Uuid,
        project_id: Uuid,
    },
    EventCreated {
        event_id: Uuid,
        owner_id: String,
    },
    CommentAdded {
        task_id: Uuid,
    },
}

/// Scopes made stale by a mutation
pub fn affected_scopes(mutation: &Mutation) -> Vec<ScopeKey> {
    match mutation {
        Mutation::UserRegistered { .. } => Vec::new(),
        Mutation::ProjectCreated { project_id, owner_id } => vec![
            ScopeKey::OwnedProjects(owner_id.clone()),
            ScopeKey::Project(*project_id),
        ],
        Mutation::ProjectRemoved {
            project_id,
            owner_id,
            member_ids,
        } => {
            let mut scopes = vec![
                ScopeKey::OwnedProjects(owner_id.clone()),
                ScopeKey::Project(*project_id),
                ScopeKey::ProjectTasks(*project_id),
            ];
            scopes.extend(member_ids.iter().cloned().map(ScopeKey::JoinedProjects));
            scopes
        }
        Mutation::ProjectJoined { user_id, .. } | Mutation::ProjectLeft { user_id, .. } => {
            vec![ScopeKey::JoinedProjects(user_id.clone())]
        }
        Mutation::TaskChanged { project_id, .. } => vec![ScopeKey::ProjectTasks(*project_id)],
        Mutation::TaskRemoved { task_id, project_id } => vec![
            ScopeKey::ProjectTasks(*project_id),
            ScopeKey::TaskComments(*task_id),
        ],
        Mutation::EventCreated { event_id, owner_id } => vec![
            ScopeKey::OwnedEvents(owner_id.clone()),
            ScopeKey::Event(*event_id),
        ],
        Mutation::CommentAdded { task_id } => vec![ScopeKey::TaskComments(*task_id)],
    }
}

impl Mutation {
    pub fn affected_scopes(&self) -> Vec<ScopeKey> {
        affected_scopes(self)
    }
}
