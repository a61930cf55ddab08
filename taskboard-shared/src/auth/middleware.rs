/// Session middleware for Axum
///
/// Every request carries an explicit [`Session`]. The middleware reads the
/// `Authorization: Bearer <token>` header, validates the token, and inserts
/// the resulting session into the request extensions. Handlers take
/// `Session` as an extractor.
///
/// # Rules
///
/// - No header: `Session::Anonymous`, or 401 when sessions are required
/// - Malformed header or invalid token: 401, whether or not sessions are required
/// - Valid token: `Session::Authenticated { user_id: claims.sub }`
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::post, Router};
/// use taskboard_shared::auth::middleware::{session_middleware, Session, SessionConfig};
///
/// async fn whoami(session: Session) -> String {
///     session.user_id().unwrap_or("anonymous").to_string()
/// }
///
/// let config = SessionConfig::new("secret", "taskboard-idp", false);
/// let app: Router = Router::new()
///     .route("/whoami", post(whoami))
///     .layer(middleware::from_fn_with_state(config, session_middleware));
/// ```

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;

use super::jwt::{validate_token, JwtError};

/// Who is making a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Session {
    /// No credentials were presented
    Anonymous,

    /// A valid token was presented
    Authenticated {
        /// Identity provider user id (token subject)
        user_id: String,
    },
}

impl Session {
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Session::Authenticated {
            user_id: user_id.into(),
        }
    }

    /// The authenticated user id, if any
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { user_id } => Some(user_id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Session>()
            .cloned()
            .unwrap_or(Session::Anonymous))
    }
}

/// Token validation settings
#[derive(Clone)]
pub struct SessionConfig {
    secret: Arc<str>,
    issuer: Arc<str>,
    required: bool,
}

impl SessionConfig {
    /// `required` rejects anonymous requests with 401
    pub fn new(secret: impl AsRef<str>, issuer: impl AsRef<str>, required: bool) -> Self {
        Self {
            secret: Arc::from(secret.as_ref()),
            issuer: Arc::from(issuer.as_ref()),
            required,
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Resolves the session for an `Authorization` header value
    pub fn resolve(&self, authorization: Option<&str>) -> Result<Session, AuthError> {
        let Some(value) = authorization else {
            return if self.required {
                Err(AuthError::MissingCredentials)
            } else {
                Ok(Session::Anonymous)
            };
        };

        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

        let claims = validate_token(token.trim(), &self.secret, &self.issuer).map_err(|e| match e {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
            _ => AuthError::InvalidToken("Invalid token".to_string()),
        })?;

        Ok(Session::Authenticated { user_id: claims.sub })
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("required", &self.required)
            .finish()
    }
}

/// Error type for session middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing authorization header while sessions are required
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingCredentials => "Missing credentials".to_string(),
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => msg,
        };

        let body = Json(json!({
            "error": "unauthorized",
            "message": message,
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Session middleware
///
/// Install with `axum::middleware::from_fn_with_state(config, session_middleware)`.
pub async fn session_middleware(
    State(config): State<SessionConfig>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default());

    let session = config.resolve(authorization).map_err(|e| {
        tracing::debug!(error = ?e, "Rejected request credentials");
        e
    })?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
