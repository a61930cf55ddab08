/// Board sync coordination
///
/// Viewers converge by polling: every scope a viewer shows is refetched on a
/// fixed interval, and a viewer's own mutation makes the affected scopes
/// stale at once. The server keeps no viewer state; it reports the scopes a
/// mutation touched and each client updates its own [`ScopeCache`].
///
/// ```text
/// viewer A ── mutation ──▶ API ── x-stale-scopes: tasks:P ──▶ viewer A invalidates, refetches now
/// viewer B ───────────── poll every 5s ─────────────────────▶ sees the change within one interval
/// ```
///
/// # Example
///
/// ```
/// use taskboard_shared::sync::{affected_scopes, Mutation, ScopeCache, ScopeKey};
/// use tokio::time::Instant;
/// use uuid::Uuid;
///
/// let project_id = Uuid::new_v4();
/// let key = ScopeKey::ProjectTasks(project_id);
///
/// let mut cache = ScopeCache::default();
/// let now = Instant::now();
/// cache.store(key.clone(), Vec::<String>::new(), now);
/// assert!(!cache.is_stale(&key, now));
///
/// let scopes = affected_scopes(&Mutation::TaskChanged { task_id: Uuid::new_v4(), project_id });
/// cache.invalidate_all(&scopes);
/// assert!(cache.is_stale(&key, now));
/// ```

pub mod cache;
pub mod mutation;
pub mod policy;
pub mod scope;

pub use cache::ScopeCache;
pub use mutation::{affected_scopes, Mutation};
pub use policy::{SyncPolicy, DEFAULT_POLL_INTERVAL};
pub use scope::{ParseScopeKeyError, ScopeKey, ScopeKind};

/// Response header carrying the scopes a mutation made stale
pub const STALE_SCOPES_HEADER: &str = "x-stale-scopes";
