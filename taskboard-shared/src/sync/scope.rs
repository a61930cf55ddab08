/// Scope keys
///
/// A scope is one queryable view of the board. Keys have a stable string
/// form used in the `x-stale-scopes` response header and in logs:
///
/// | Scope | Key |
/// |---|---|
/// | tasks of project P | `tasks:{P}` |
/// | project P | `project:{P}` |
/// | projects owned by U | `projects:owned:{U}` |
/// | projects joined by U | `projects:joined:{U}` |
/// | comments of task T | `comments:{T}` |
/// | events owned by U | `events:owned:{U}` |
/// | event E | `event:{E}` |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a queryable view
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScopeKey {
    ProjectTasks(Uuid),
    Project(Uuid),
    OwnedProjects(String),
    JoinedProjects(String),
    TaskComments(Uuid),
    OwnedEvents(String),
    Event(Uuid),
}

/// Scope key without its subject, used to configure poll intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    ProjectTasks,
    Project,
    OwnedProjects,
    JoinedProjects,
    TaskComments,
    OwnedEvents,
    Event,
}

impl ScopeKey {
    pub fn kind(&self) -> ScopeKind {
        match self {
            ScopeKey::ProjectTasks(_) => ScopeKind::ProjectTasks,
            ScopeKey::Project(_) => ScopeKind::Project,
            ScopeKey::OwnedProjects(_) => ScopeKind::OwnedProjects,
            ScopeKey::JoinedProjects(_) => ScopeKind::JoinedProjects,
            ScopeKey::TaskComments(_) => ScopeKind::TaskComments,
            ScopeKey::OwnedEvents(_) => ScopeKind::OwnedEvents,
            ScopeKey::Event(_) => ScopeKind::Event,
        }
    }

    /// Parses a comma-separated list such as an `x-stale-scopes` header
    pub fn parse_list(raw: &str) -> Result<Vec<ScopeKey>, ParseScopeKeyError> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }

    /// Joins keys into the `x-stale-scopes` header form
    pub fn join(keys: &[ScopeKey]) -> String {
        keys.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKey::ProjectTasks(id) => write!(f, "tasks:{}", id),
            ScopeKey::Project(id) => write!(f, "project:{}", id),
            ScopeKey::OwnedProjects(user) => write!(f, "projects:owned:{}", user),
            ScopeKey::JoinedProjects(user) => write!(f, "projects:joined:{}", user),
            ScopeKey::TaskComments(id) => write!(f, "comments:{}", id),
            ScopeKey::OwnedEvents(user) => write!(f, "events:owned:{}", user),
            ScopeKey::Event(id) => write!(f, "event:{}", id),
        }
    }
}

/// Error returned for a malformed scope key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid scope key: {0}")]
pub struct ParseScopeKeyError(pub String);

impl FromStr for ScopeKey {
    type Err = ParseScopeKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseScopeKeyError(s.to_string());
        let uuid = |raw: &str| Uuid::parse_str(raw).map_err(|_| invalid());
        let user = |raw: &str| {
            if raw.is_empty() {
                Err(invalid())
            } else {
                Ok(raw.to_string())
            }
        };

        if let Some(rest) = s.strip_prefix("projects:owned:") {
            return user(rest).map(ScopeKey::OwnedProjects);
        }
        if let Some(rest) = s.strip_prefix("projects:joined:") {
            return user(rest).map(ScopeKey::JoinedProjects);
        }
        if let Some(rest) = s.strip_prefix("events:owned:") {
            return user(rest).map(ScopeKey::OwnedEvents);
        }

        match s.split_once(':') {
            Some(("tasks", rest)) => uuid(rest).map(ScopeKey::ProjectTasks),
            Some(("project", rest)) => uuid(rest).map(ScopeKey::Project),
            Some(("comments", rest)) => uuid(rest).map(ScopeKey::TaskComments),
            Some(("event", rest)) => uuid(rest).map(ScopeKey::Event),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for ScopeKey {
    type Error = ParseScopeKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScopeKey> for String {
    fn from(key: ScopeKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_forms() {
        let id = Uuid::nil();
        assert_eq!(
            ScopeKey::ProjectTasks(id).to_string(),
            "tasks:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(ScopeKey::OwnedProjects("u1".into()).to_string(), "projects:owned:u1");
        assert_eq!(ScopeKey::JoinedProjects("u1".into()).to_string(), "projects:joined:u1");
        assert_eq!(ScopeKey::OwnedEvents("u1".into()).to_string(), "events:owned:u1");
    }

    #[test]
    fn test_parse_display_round_trip() {
        let id = Uuid::new_v4();
        let keys = vec![
            ScopeKey::ProjectTasks(id),
            ScopeKey::Project(id),
            ScopeKey::OwnedProjects("auth0|abc:def".into()),
            ScopeKey::JoinedProjects("u2".into()),
            ScopeKey::TaskComments(id),
            ScopeKey::OwnedEvents("u3".into()),
            ScopeKey::Event(id),
        ];
        for key in &keys {
            assert_eq!(key.to_string().parse::<ScopeKey>().unwrap(), *key);
        }
        assert_eq!(ScopeKey::parse_list(&ScopeKey::join(&keys)).unwrap(), keys);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("tasks:not-a-uuid".parse::<ScopeKey>().is_err());
        assert!("projects:owned:".parse::<ScopeKey>().is_err());
        assert!("widgets:1".parse::<ScopeKey>().is_err());
        assert!("".parse::<ScopeKey>().is_err());
    }

    #[test]
    fn test_parse_list_skips_empty_parts() {
        assert_eq!(ScopeKey::parse_list("").unwrap(), vec![]);
        assert_eq!(
            ScopeKey::parse_list(" projects:owned:u1 , ").unwrap(),
            vec![ScopeKey::OwnedProjects("u1".into())]
        );
    }
}
