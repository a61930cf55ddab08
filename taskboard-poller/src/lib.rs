//! # Taskboard Poller Library
//!
//! A headless board viewer. It watches a user's project and event lists
//! plus a set of project boards, refetching every scope on its poll
//! interval and logging what changed.
//!
//! ## Modules
//!
//! - `client`: Board API client and the [`client::BoardSource`] seam
//! - `config`: Environment configuration
//! - `viewer`: Poll loop over a scope cache

pub mod client;
pub mod config;
pub mod viewer;

use taskboard_shared::sync::ScopeKey;
use uuid::Uuid;

/// Scopes a viewer of `user_id`'s dashboard shows
pub fn dashboard_scopes(user_id: &str) -> Vec<ScopeKey> {
    vec![
        ScopeKey::OwnedProjects(user_id.to_string()),
        ScopeKey::JoinedProjects(user_id.to_string()),
        ScopeKey::OwnedEvents(user_id.to_string()),
    ]
}

/// Scopes a viewer of one project board shows
pub fn board_scopes(project_id: Uuid) -> Vec<ScopeKey> {
    vec![ScopeKey::Project(project_id), ScopeKey::ProjectTasks(project_id)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_scopes() {
        let keys: Vec<String> = dashboard_scopes("idp|alice").iter().map(ToString::to_string).collect();
        assert_eq!(
            keys,
            vec!["projects:owned:idp|alice", "projects:joined:idp|alice", "events:owned:idp|alice"]
        );
    }

    #[test]
    fn test_board_scopes() {
        let id = Uuid::new_v4();
        assert_eq!(
            board_scopes(id),
            vec![ScopeKey::Project(id), ScopeKey::ProjectTasks(id)]
        );
    }
}
