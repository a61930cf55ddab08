/// Middleware modules for the API server
///
/// Session extraction lives in `taskboard_shared::auth::middleware`; this
/// module holds the HTTP-only layers.
///
/// - `security`: security and caching headers

pub mod security;
