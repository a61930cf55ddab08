/// Board viewer
///
/// A headless board viewer: it keeps a [`ScopeCache`] of every scope it
/// shows, refetches each scope when its poll interval elapses, and refetches
/// at once the scopes its own mutations report stale.
///
/// # Loop
///
/// ```text
/// BoardViewer::run
///   ├─> sleep until the earliest scope deadline (or shutdown)
///   ├─> fetch every due scope concurrently
///   ├─> store values, report which ones changed
///   └─> on fetch errors, back off for one poll interval
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_poller::client::HttpBoardClient;
/// use taskboard_poller::viewer::BoardViewer;
/// use taskboard_shared::sync::{ScopeKey, SyncPolicy};
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = HttpBoardClient::new("http://127.0.0.1:8080", None)?;
/// let mut viewer = BoardViewer::new(client, SyncPolicy::default());
/// viewer.track(ScopeKey::OwnedProjects("idp|alice".into()));
///
/// let shutdown = viewer.shutdown_token();
/// tokio::spawn(async move {
///     let _ = tokio::signal::ctrl_c().await;
///     shutdown.cancel();
/// });
///
/// viewer.run().await;
/// # Ok(())
/// # }
/// ```

use futures::future::join_all;
use serde_json::Value;
use taskboard_shared::sync::{ScopeCache, ScopeKey, SyncPolicy};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::client::{BoardSource, ClientError, MutationOutcome};

/// What a fetch found
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeChange {
    /// First value seen for the scope
    Loaded,
    /// The value differs from the cached one
    Changed,
    /// Same as before
    Unchanged,
    /// The scope's entity was deleted or access to it was revoked; it was untracked
    Gone,
}

/// Outcome of one fetch
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeUpdate {
    pub key: ScopeKey,
    pub change: ScopeChange,
}

/// Outcome of one polling round
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PollReport {
    pub updates: Vec<ScopeUpdate>,

    /// Scopes whose fetch failed; they stay due
    pub failed: Vec<ScopeKey>,
}

impl PollReport {
    /// Scopes whose value changed or appeared
    pub fn changed(&self) -> impl Iterator<Item = &ScopeKey> {
        self.updates
            .iter()
            .filter(|u| matches!(u.change, ScopeChange::Loaded | ScopeChange::Changed))
            .map(|u| &u.key)
    }
}

/// Board viewer over a [`BoardSource`]
pub struct BoardViewer<S> {
    source: S,
    cache: ScopeCache<Value>,
    shutdown_token: CancellationToken,
}

impl<S: BoardSource> BoardViewer<S> {
    pub fn new(source: S, policy: SyncPolicy) -> Self {
        Self {
            source,
            cache: ScopeCache::new(policy),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Uses `token` for shutdown instead of a private one
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown_token = token;
        self
    }

    /// Gets shutdown token
    ///
    /// Used to signal graceful shutdown from external handlers.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Starts showing a scope; it is fetched on the next round
    pub fn track(&mut self, key: ScopeKey) {
        self.cache.track(key);
    }

    pub fn untrack(&mut self, key: &ScopeKey) {
        self.cache.untrack(key);
    }

    /// Last fetched value of a scope
    pub fn value(&self, key: &ScopeKey) -> Option<&Value> {
        self.cache.get(key)
    }

    pub fn cache(&self) -> &ScopeCache<Value> {
        &self.cache
    }

    /// Fetches every scope due at `now`
    pub async fn poll_due(&mut self, now: Instant) -> PollReport {
        let due = self.cache.due(now);
        if due.is_empty() {
            return PollReport::default();
        }

        let source = &self.source;
        let results = join_all(due.iter().map(|key| source.fetch(key))).await;

        let mut report = PollReport::default();
        for (key, result) in due.into_iter().zip(results) {
            match result {
                Ok(value) => {
                    let change = match self.cache.store(key.clone(), value.clone(), now) {
                        None => ScopeChange::Loaded,
                        Some(previous) if previous == value => ScopeChange::Unchanged,
                        Some(_) => ScopeChange::Changed,
                    };
                    log_change(&key, &change, &value);
                    report.updates.push(ScopeUpdate { key, change });
                }
                Err(e) if e.is_gone() => {
                    tracing::info!(scope = %key, error = %e, "Scope no longer readable, untracking");
                    self.cache.untrack(&key);
                    report.updates.push(ScopeUpdate {
                        key,
                        change: ScopeChange::Gone,
                    });
                }
                Err(e) => {
                    tracing::warn!(scope = %key, error = %e, "Failed to fetch scope");
                    report.failed.push(key);
                }
            }
        }

        report
    }

    /// Sends a mutation and refetches the scopes it made stale
    ///
    /// Only tracked scopes are refetched.
    pub async fn mutate(&mut self, path: &str, body: Value) -> Result<(MutationOutcome, PollReport), ClientError> {
        let outcome = self.source.mutate(path, body).await?;

        let invalidated = self.cache.invalidate_all(&outcome.stale_scopes);
        tracing::debug!(path = %path, invalidated, "Mutation applied");

        let report = self.poll_due(Instant::now()).await;
        Ok((outcome, report))
    }

    /// Polls until the shutdown token is cancelled
    pub async fn run(&mut self) {
        tracing::info!(scopes = self.cache.keys().count(), "Board viewer starting");
        let retry_delay = self.cache.policy().default_interval();
        let mut wake_at = Instant::now();

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                _ = sleep_until(wake_at) => {}
            }

            let now = Instant::now();
            let report = self.poll_due(now).await;

            wake_at = if report.failed.is_empty() {
                match self.cache.next_deadline(now) {
                    Some(deadline) => deadline,
                    None => {
                        tracing::info!("No scopes left to watch");
                        break;
                    }
                }
            } else {
                now + retry_delay
            };
        }

        tracing::info!("Board viewer shut down");
    }
}

fn log_change(key: &ScopeKey, change: &ScopeChange, value: &Value) {
    let items = value.as_array().map(Vec::len);
    match change {
        ScopeChange::Loaded => tracing::info!(scope = %key, ?items, "Scope loaded"),
        ScopeChange::Changed => tracing::info!(scope = %key, ?items, "Scope changed"),
        ScopeChange::Unchanged => tracing::trace!(scope = %key, "Scope unchanged"),
        ScopeChange::Gone => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use uuid::Uuid;

    /// Scope values kept in memory, with a fetch counter
    #[derive(Clone, Default)]
    struct FakeSource {
        values: Arc<Mutex<HashMap<ScopeKey, Value>>>,
        fetches: Arc<Mutex<Vec<ScopeKey>>>,
        failing: Arc<Mutex<bool>>,
        revoked: Arc<Mutex<bool>>,
    }

    impl FakeSource {
        fn set(&self, key: ScopeKey, value: Value) {
            self.values.lock().unwrap().insert(key, value);
        }

        fn remove(&self, key: &ScopeKey) {
            self.values.lock().unwrap().remove(key);
        }

        fn fetch_count(&self) -> usize {
            self.fetches.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl BoardSource for FakeSource {
        async fn fetch(&self, key: &ScopeKey) -> Result<Value, ClientError> {
            self.fetches.lock().unwrap().push(key.clone());
            if *self.revoked.lock().unwrap() {
                return Err(ClientError::Status {
                    status: StatusCode::FORBIDDEN,
                    message: "Not a collaborator".into(),
                });
            }
            if *self.failing.lock().unwrap() {
                return Err(ClientError::Status {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Something went wrong".into(),
                });
            }
            self.values
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| ClientError::Status {
                    status: StatusCode::NOT_FOUND,
                    message: "not found".into(),
                })
        }

        async fn mutate(&self, _path: &str, body: Value) -> Result<MutationOutcome, ClientError> {
            let project_id: Uuid = body["project_id"].as_str().unwrap().parse().unwrap();
            let key = ScopeKey::ProjectTasks(project_id);
            self.set(key.clone(), json!([{ "status": body["status"] }]));
            Ok(MutationOutcome {
                body,
                stale_scopes: vec![key],
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_round_loads_everything() {
        let source = FakeSource::default();
        let key = ScopeKey::OwnedProjects("idp|alice".into());
        source.set(key.clone(), json!([]));

        let mut viewer = BoardViewer::new(source.clone(), SyncPolicy::default());
        viewer.track(key.clone());

        let report = viewer.poll_due(Instant::now()).await;
        assert_eq!(
            report.updates,
            vec![ScopeUpdate {
                key: key.clone(),
                change: ScopeChange::Loaded
            }]
        );
        assert_eq!(viewer.value(&key), Some(&json!([])));

        // Nothing is due again until the interval passes
        assert!(viewer.poll_due(Instant::now()).await.updates.is_empty());
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_change_seen_within_interval() {
        let source = FakeSource::default();
        let key = ScopeKey::ProjectTasks(Uuid::new_v4());
        source.set(key.clone(), json!([{ "status": "pending" }]));

        let mut viewer = BoardViewer::new(source.clone(), SyncPolicy::default());
        viewer.track(key.clone());
        viewer.poll_due(Instant::now()).await;

        // Another viewer moves the card
        source.set(key.clone(), json!([{ "status": "done" }]));

        tokio::time::advance(Duration::from_secs(5)).await;
        let report = viewer.poll_due(Instant::now()).await;

        assert_eq!(report.changed().collect::<Vec<_>>(), vec![&key]);
        assert_eq!(viewer.value(&key).unwrap()[0]["status"], "done");
    }

    #[tokio::test(start_paused = true)]
    async fn test_own_mutation_refreshes_immediately() {
        let source = FakeSource::default();
        let project_id = Uuid::new_v4();
        let key = ScopeKey::ProjectTasks(project_id);
        source.set(key.clone(), json!([{ "status": "pending" }]));

        let mut viewer = BoardViewer::new(source.clone(), SyncPolicy::default());
        viewer.track(key.clone());
        viewer.poll_due(Instant::now()).await;

        let (_, report) = viewer
            .mutate(
                "/v1/tasks/drop",
                json!({ "project_id": project_id.to_string(), "status": "done" }),
            )
            .await
            .unwrap();

        assert_eq!(report.changed().collect::<Vec<_>>(), vec![&key]);
        assert_eq!(viewer.value(&key).unwrap()[0]["status"], "done");
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_scope_is_untracked() {
        let source = FakeSource::default();
        let key = ScopeKey::Project(Uuid::new_v4());
        source.set(key.clone(), json!({ "name": "Launch" }));

        let mut viewer = BoardViewer::new(source.clone(), SyncPolicy::default());
        viewer.track(key.clone());
        viewer.poll_due(Instant::now()).await;

        source.remove(&key);
        tokio::time::advance(Duration::from_secs(5)).await;
        let report = viewer.poll_due(Instant::now()).await;

        assert_eq!(report.updates[0].change, ScopeChange::Gone);
        assert_eq!(viewer.cache().keys().count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revoked_scope_is_untracked() {
        let source = FakeSource::default();
        let key = ScopeKey::ProjectTasks(Uuid::new_v4());
        source.set(key.clone(), json!([]));

        let mut viewer = BoardViewer::new(source.clone(), SyncPolicy::default());
        viewer.track(key.clone());
        viewer.poll_due(Instant::now()).await;

        // The viewer's user left the project
        *source.revoked.lock().unwrap() = true;
        tokio::time::advance(Duration::from_secs(5)).await;
        let report = viewer.poll_due(Instant::now()).await;

        assert_eq!(report.updates[0].change, ScopeChange::Gone);
        assert!(report.failed.is_empty());
        assert_eq!(viewer.cache().keys().count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_stays_due() {
        let source = FakeSource::default();
        let key = ScopeKey::OwnedEvents("idp|alice".into());
        source.set(key.clone(), json!([]));
        *source.failing.lock().unwrap() = true;

        let mut viewer = BoardViewer::new(source.clone(), SyncPolicy::default());
        viewer.track(key.clone());

        let report = viewer.poll_due(Instant::now()).await;
        assert_eq!(report.failed, vec![key.clone()]);
        assert!(viewer.cache().is_stale(&key, Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_on_schedule_until_cancelled() {
        let source = FakeSource::default();
        let key = ScopeKey::ProjectTasks(Uuid::new_v4());
        source.set(key.clone(), json!([]));

        let mut viewer = BoardViewer::new(source.clone(), SyncPolicy::default());
        viewer.track(key);
        let shutdown = viewer.shutdown_token();

        let handle = tokio::spawn(async move { viewer.run().await });

        // Initial fetch plus one per elapsed interval
        tokio::time::sleep(Duration::from_millis(12_500)).await;
        assert_eq!(source.fetch_count(), 3);

        shutdown.cancel();
        handle.await.unwrap();
    }
}
