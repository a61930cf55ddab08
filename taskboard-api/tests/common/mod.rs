#![allow(dead_code)]

/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An app over a fresh in-memory store
/// - Session token generation
/// - JSON request helpers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use taskboard_api::{
    app::{build_router, AppState},
    config::{ApiConfig, AuthConfig, Config, LogFormat, StoreBackend, StoreConfig},
};
use taskboard_shared::{
    auth::jwt::{create_token, Claims},
    store::memory::MemoryStore,
    sync::STALE_SCOPES_HEADER,
};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const JWT_ISSUER: &str = "taskboard-test";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: MemoryStore,
    pub app: Router,
}

/// A decoded response
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub stale_scopes: Option<String>,
    pub body: Value,
}

pub fn test_config(auth_required: bool) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
            jwt_issuer: JWT_ISSUER.to_string(),
            required: auth_required,
        },
        log_format: LogFormat::Pretty,
    }
}

impl TestContext {
    /// App with sessions required
    pub fn new() -> Self {
        Self::with_auth(true)
    }

    pub fn with_auth(required: bool) -> Self {
        let store = MemoryStore::new();
        let state = AppState::new(Arc::new(store.clone()), test_config(required));
        let app = build_router(state);
        TestContext { store, app }
    }

    /// POSTs `body` as `user` (or anonymously)
    pub async fn post(&self, uri: &str, user: Option<&str>, body: Value) -> TestResponse {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(user) = user {
            request = request.header(header::AUTHORIZATION, bearer(user));
        }

        self.send(request.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let stale_scopes = response
            .headers()
            .get(STALE_SCOPES_HEADER)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            stale_scopes,
            body,
        }
    }
}

impl TestResponse {
    /// Asserts the status, printing the body on mismatch
    pub fn expect(self, status: StatusCode) -> Value {
        assert_eq!(self.status, status, "unexpected status, body: {}", self.body);
        self.body
    }
}

/// Authorization header value for `user_id`
pub fn bearer(user_id: &str) -> String {
    let token = create_token(&Claims::new(user_id, JWT_ISSUER), JWT_SECRET).unwrap();
    format!("Bearer {}", token)
}
