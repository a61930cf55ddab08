/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_api::{app::{build_router, AppState}, config::Config};
/// use taskboard_shared::store::memory::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    handler::Handler,
    http::{header, HeaderValue, Method},
    routing::{get, post, MethodRouter},
    Router,
};
use std::sync::Arc;
use taskboard_shared::{
    auth::middleware::{session_middleware, SessionConfig},
    store::EntityStore,
    sync::STALE_SCOPES_HEADER,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Entity store backing every collection
    pub store: Arc<dyn EntityStore>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn EntityStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Store handle for service calls
    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    /// Token validation settings derived from the config
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(
            &self.config.auth.jwt_secret,
            &self.config.auth.jwt_issuer,
            self.config.auth.required,
        )
    }
}

/// A POST-only route; other methods get a JSON 405
fn post_only<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    post(handler).fallback(method_not_allowed)
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn not_found() -> ApiError {
    ApiError::NotFound("No such route".to_string())
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                  # Health check (public)
/// └── /v1/                         # Board operations, all POST + JSON
///     ├── /users/{create,get}
///     ├── /projects/{create,get,list,joined,join,leave,remove}
///     ├── /tasks/{create,list,update,drop,assign_event,remove}
///     ├── /events/{create,get,list}
///     └── /comments/{create,list}
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Session extraction (`/v1` only)
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
/// 4. Security headers
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{comments, events, health, projects, tasks, users};

    // Health check (public, no session)
    let health_routes = Router::new().route("/health", get(health::health_check));

    let user_routes = Router::new()
        .route("/create", post_only(users::create_user))
        .route("/get", post_only(users::get_user));

    let project_routes = Router::new()
        .route("/create", post_only(projects::create_project))
        .route("/get", post_only(projects::get_project))
        .route("/list", post_only(projects::list_projects))
        .route("/joined", post_only(projects::list_joined))
        .route("/join", post_only(projects::join_project))
        .route("/leave", post_only(projects::leave_project))
        .route("/remove", post_only(projects::remove_project));

    let task_routes = Router::new()
        .route("/create", post_only(tasks::create_task))
        .route("/list", post_only(tasks::list_tasks))
        .route("/update", post_only(tasks::update_task))
        .route("/drop", post_only(tasks::drop_task))
        .route("/assign_event", post_only(tasks::assign_event))
        .route("/remove", post_only(tasks::remove_task));

    let event_routes = Router::new()
        .route("/create", post_only(events::create_event))
        .route("/get", post_only(events::get_event))
        .route("/list", post_only(events::list_events));

    let comment_routes = Router::new()
        .route("/create", post_only(comments::create_comment))
        .route("/list", post_only(comments::list_comments));

    // Build complete v1 API behind the session layer
    let v1_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/events", event_routes)
        .nest("/comments", comment_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.session_config(),
            session_middleware,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .expose_headers([header::HeaderName::from_static(STALE_SCOPES_HEADER)])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
