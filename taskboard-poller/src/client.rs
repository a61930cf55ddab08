/// Board API client
///
/// [`BoardSource`] is what a viewer reads scopes from and sends mutations
/// to. [`HttpBoardClient`] implements it against the API server; tests use
/// in-process fakes.
///
/// # Scope reads
///
/// | Scope | Request |
/// |---|---|
/// | `tasks:{project}` | `POST /v1/tasks/list {project_id}` |
/// | `project:{id}` | `POST /v1/projects/get {target_id}` |
/// | `projects:owned:{user}` | `POST /v1/projects/list {owner_id}` |
/// | `projects:joined:{user}` | `POST /v1/projects/joined {user_id}` |
/// | `comments:{task}` | `POST /v1/comments/list {task_id}` |
/// | `events:owned:{user}` | `POST /v1/events/list {owner_id}` |
/// | `event:{id}` | `POST /v1/events/get {target_id}` |

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use taskboard_shared::sync::{ParseScopeKeyError, ScopeKey, STALE_SCOPES_HEADER};

/// Error type for board API calls
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request did not complete
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error status
    #[error("server returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// The stale-scopes header did not parse
    #[error(transparent)]
    InvalidScopes(#[from] ParseScopeKeyError),
}

impl ClientError {
    /// Whether the scope can no longer be read: deleted, or access revoked
    pub fn is_gone(&self) -> bool {
        matches!(
            self,
            ClientError::Status { status, .. }
                if *status == StatusCode::NOT_FOUND || *status == StatusCode::FORBIDDEN
        )
    }
}

/// Result of a mutation
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    /// Response body
    pub body: Value,

    /// Scopes the server reported stale
    pub stale_scopes: Vec<ScopeKey>,
}

/// Where a viewer reads scopes from
#[async_trait]
pub trait BoardSource: Send + Sync {
    /// Fetches the current value of a scope
    async fn fetch(&self, key: &ScopeKey) -> Result<Value, ClientError>;

    /// Sends a mutation to `path`
    async fn mutate(&self, path: &str, body: Value) -> Result<MutationOutcome, ClientError>;
}

/// Route and body that read a scope
pub fn scope_request(key: &ScopeKey) -> (&'static str, Value) {
    match key {
        ScopeKey::ProjectTasks(project_id) => ("/v1/tasks/list", json!({ "project_id": project_id })),
        ScopeKey::Project(id) => ("/v1/projects/get", json!({ "target_id": id })),
        ScopeKey::OwnedProjects(user) => ("/v1/projects/list", json!({ "owner_id": user })),
        ScopeKey::JoinedProjects(user) => ("/v1/projects/joined", json!({ "user_id": user })),
        ScopeKey::TaskComments(task_id) => ("/v1/comments/list", json!({ "task_id": task_id })),
        ScopeKey::OwnedEvents(user) => ("/v1/events/list", json!({ "owner_id": user })),
        ScopeKey::Event(id) => ("/v1/events/get", json!({ "target_id": id })),
    }
}

/// HTTP implementation of [`BoardSource`]
#[derive(Debug, Clone)]
pub struct HttpBoardClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBoardClient {
    /// Creates a client for the API at `base_url`
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response, ClientError> {
        let mut request = self.http.post(format!("{}{}", self.base_url, path)).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("message").and_then(Value::as_str).map(String::from))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        Err(ClientError::Status { status, message })
    }
}

#[async_trait]
impl BoardSource for HttpBoardClient {
    async fn fetch(&self, key: &ScopeKey) -> Result<Value, ClientError> {
        let (path, body) = scope_request(key);
        let response = self.post(path, &body).await?;
        Ok(response.json().await?)
    }

    async fn mutate(&self, path: &str, body: Value) -> Result<MutationOutcome, ClientError> {
        let response = self.post(path, &body).await?;

        let stale_scopes = match response.headers().get(STALE_SCOPES_HEADER) {
            Some(value) => ScopeKey::parse_list(value.to_str().unwrap_or_default())?,
            None => Vec::new(),
        };
        let body = response.json().await?;

        Ok(MutationOutcome { body, stale_scopes })
    }
}
