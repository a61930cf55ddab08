/// Poll interval configuration

use std::collections::HashMap;
use std::time::Duration;

use super::scope::{ScopeKey, ScopeKind};

/// Default poll interval for every scope
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Poll interval per scope kind
///
/// Every scope is refetched at least this often regardless of local
/// mutations; a local mutation makes its scopes stale immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPolicy {
    default_interval: Duration,
    overrides: HashMap<ScopeKind, Duration>,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self::uniform(DEFAULT_POLL_INTERVAL)
    }
}

impl SyncPolicy {
    /// Same interval for every scope
    pub fn uniform(interval: Duration) -> Self {
        Self {
            default_interval: interval,
            overrides: HashMap::new(),
        }
    }

    /// Overrides the interval for one kind of scope
    pub fn with_interval(mut self, kind: ScopeKind, interval: Duration) -> Self {
        self.overrides.insert(kind, interval);
        self
    }

    /// Interval for a scope
    pub fn interval_for(&self, key: &ScopeKey) -> Duration {
        self.overrides
            .get(&key.kind())
            .copied()
            .unwrap_or(self.default_interval)
    }

    pub fn default_interval(&self) -> Duration {
        self.default_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_default_is_five_seconds_everywhere() {
        let policy = SyncPolicy::default();
        for key in [
            ScopeKey::TaskComments(Uuid::new_v4()),
            ScopeKey::OwnedProjects("u".into()),
            ScopeKey::JoinedProjects("u".into()),
            ScopeKey::OwnedEvents("u".into()),
            ScopeKey::ProjectTasks(Uuid::new_v4()),
        ] {
            assert_eq!(policy.interval_for(&key), Duration::from_secs(5));
        }
    }

    #[test]
    fn test_override_applies_to_one_kind() {
        let policy = SyncPolicy::default().with_interval(ScopeKind::TaskComments, Duration::from_secs(2));
        assert_eq!(
            policy.interval_for(&ScopeKey::TaskComments(Uuid::new_v4())),
            Duration::from_secs(2)
        );
        assert_eq!(
            policy.interval_for(&ScopeKey::ProjectTasks(Uuid::new_v4())),
            DEFAULT_POLL_INTERVAL
        );
    }
}
