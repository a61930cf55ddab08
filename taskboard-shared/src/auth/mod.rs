/// Sessions and authorization
///
/// # Modules
///
/// - [`jwt`]: session token validation (HS256)
/// - [`middleware`]: per-request [`middleware::Session`] extraction for Axum
/// - [`authorization`]: ownership and collaborator checks
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::authorization::require_actor;
/// use taskboard_shared::auth::jwt::{create_token, Claims};
/// use taskboard_shared::auth::middleware::SessionConfig;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let token = create_token(&Claims::new("idp|42", "taskboard-idp"), "secret")?;
///
/// let config = SessionConfig::new("secret", "taskboard-idp", true);
/// let session = config.resolve(Some(&format!("Bearer {}", token))).map_err(|e| format!("{:?}", e))?;
/// require_actor(&session, "idp|42")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
