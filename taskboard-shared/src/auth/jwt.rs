/// Session token validation
///
/// Session tokens are issued by the identity provider and signed with a
/// shared HS256 secret. The board only validates them; [`create_token`]
/// exists for development tooling and tests.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Validation**: signature, expiration, not-before and issuer
/// - **Subject**: the identity provider's opaque user id
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::jwt::{create_token, validate_token, Claims};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new("idp|42", "taskboard-idp");
/// let token = create_token(&claims, "secret-key")?;
///
/// let validated = validate_token(&token, "secret-key", "taskboard-idp")?;
/// assert_eq!(validated.sub, "idp|42");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Default token lifetime for locally issued tokens
pub const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },
}

/// JWT claims
///
/// - `sub`: identity provider user id
/// - `iss`: issuer, checked against configuration
/// - `iat`, `nbf`, `exp`: Unix timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - identity provider user id
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Claims valid for [`DEFAULT_TOKEN_LIFETIME_HOURS`]
    pub fn new(user_id: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self::with_expiration(user_id, issuer, Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS))
    }

    /// Claims with a custom lifetime
    pub fn with_expiration(
        user_id: impl Into<String>,
        issuer: impl Into<String>,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id.into(),
            iss: issuer.into(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a token and extracts its claims
///
/// # Errors
///
/// - `Expired` if `exp` has passed
/// - `InvalidIssuer` if `iss` is not `issuer`
/// - `ValidationError` for bad signatures, malformed tokens or an empty subject
pub fn validate_token(token: &str, secret: &str, issuer: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: issuer.to_string(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    if token_data.claims.sub.trim().is_empty() {
        return Err(JwtError::ValidationError("Token subject is empty".to_string()));
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";
    const ISSUER: &str = "taskboard-test";

    #[test]
    fn test_create_and_validate() {
        let claims = Claims::new("idp|1", ISSUER);
        let token = create_token(&claims, SECRET).unwrap();

        let validated = validate_token(&token, SECRET, ISSUER).unwrap();
        assert_eq!(validated, claims);
        assert!(!validated.is_expired());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(&Claims::new("idp|1", ISSUER), SECRET).unwrap();
        assert!(matches!(
            validate_token(&token, "another-secret", ISSUER),
            Err(JwtError::ValidationError(_))
        ));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let token = create_token(&Claims::new("idp|1", "someone-else"), SECRET).unwrap();
        assert!(matches!(
            validate_token(&token, SECRET, ISSUER),
            Err(JwtError::InvalidIssuer { .. })
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims::with_expiration("idp|1", ISSUER, Duration::hours(-2));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET, ISSUER), Err(JwtError::Expired)));
    }

    #[test]
    fn test_empty_subject_rejected() {
        let token = create_token(&Claims::new("", ISSUER), SECRET).unwrap();
        assert!(validate_token(&token, SECRET, ISSUER).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(validate_token("not.a.token", SECRET, ISSUER).is_err());
    }
}
