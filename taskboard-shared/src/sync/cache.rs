/// Client-side scope cache
///
/// Holds the last fetched value of each tracked scope and decides when it
/// must be refetched. A scope is stale when
///
/// - it has never been fetched,
/// - it was invalidated after a local mutation, or
/// - its poll interval has elapsed since the last fetch.
///
/// All time-dependent methods take `now` explicitly so callers (and tests)
/// control the clock.

use std::collections::BTreeMap;
use tokio::time::Instant;

use super::policy::SyncPolicy;
use super::scope::ScopeKey;

#[derive(Debug, Clone)]
struct Entry<T> {
    value: Option<T>,
    fetched_at: Option<Instant>,
    invalidated: bool,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            value: None,
            fetched_at: None,
            invalidated: false,
        }
    }
}

/// Last known values of a set of scopes
#[derive(Debug, Clone)]
pub struct ScopeCache<T> {
    policy: SyncPolicy,
    entries: BTreeMap<ScopeKey, Entry<T>>,
}

impl<T> ScopeCache<T> {
    pub fn new(policy: SyncPolicy) -> Self {
        Self {
            policy,
            entries: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> &SyncPolicy {
        &self.policy
    }

    /// Starts tracking a scope; it is due immediately
    pub fn track(&mut self, key: ScopeKey) {
        self.entries.entry(key).or_default();
    }

    /// Stops tracking a scope, returning its last value
    pub fn untrack(&mut self, key: &ScopeKey) -> Option<T> {
        self.entries.remove(key).and_then(|entry| entry.value)
    }

    /// Tracked scopes in key order
    pub fn keys(&self) -> impl Iterator<Item = &ScopeKey> {
        self.entries.keys()
    }

    pub fn get(&self, key: &ScopeKey) -> Option<&T> {
        self.entries.get(key).and_then(|entry| entry.value.as_ref())
    }

    /// Whether a scope must be refetched at `now`
    ///
    /// Untracked scopes are always stale.
    pub fn is_stale(&self, key: &ScopeKey, now: Instant) -> bool {
        let Some(entry) = self.entries.get(key) else {
            return true;
        };
        match entry.fetched_at {
            None => true,
            Some(_) if entry.invalidated => true,
            Some(fetched_at) => now.saturating_duration_since(fetched_at) >= self.policy.interval_for(key),
        }
    }

    /// Marks a tracked scope stale; returns whether it was tracked
    pub fn invalidate(&mut self, key: &ScopeKey) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.invalidated = true;
                true
            }
            None => false,
        }
    }

    /// Marks every tracked scope in `keys` stale, returning how many were tracked
    pub fn invalidate_all<'a, I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a ScopeKey>,
    {
        keys.into_iter().filter(|key| self.invalidate(key)).count()
    }

    /// Records a fresh value, tracking the scope if needed
    ///
    /// Returns the previous value.
    pub fn store(&mut self, key: ScopeKey, value: T, now: Instant) -> Option<T> {
        let entry = self.entries.entry(key).or_default();
        entry.fetched_at = Some(now);
        entry.invalidated = false;
        entry.value.replace(value)
    }

    /// Scopes that are stale at `now`, in key order
    pub fn due(&self, now: Instant) -> Vec<ScopeKey> {
        self.entries
            .keys()
            .filter(|key| self.is_stale(key, now))
            .cloned()
            .collect()
    }

    /// Earliest instant at which some scope becomes stale
    ///
    /// Returns `now` when something is already due and `None` when nothing
    /// is tracked.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        self.entries
            .iter()
            .map(|(key, entry)| match entry.fetched_at {
                Some(fetched_at) if !entry.invalidated => {
                    (fetched_at + self.policy.interval_for(key)).max(now)
                }
                _ => now,
            })
            .min()
    }
}

impl<T> Default for ScopeCache<T> {
    fn default() -> Self {
        Self::new(SyncPolicy::default())
    }
}
