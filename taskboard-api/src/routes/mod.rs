/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: user registration and lookup
/// - `projects`: projects, enrollment and memberships
/// - `tasks`: task lifecycle and drag-and-drop moves
/// - `events`: events
/// - `comments`: task discussion threads
///
/// Every mutation returns a [`StaleScopes`] part naming the scope keys it
/// invalidated, so the caller can refresh them without waiting for its next
/// poll.

pub mod comments;
pub mod events;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;

use axum::{
    http::HeaderValue,
    response::{IntoResponseParts, ResponseParts},
};
use serde::Deserialize;
use std::convert::Infallible;
use taskboard_shared::sync::{Mutation, ScopeKey, STALE_SCOPES_HEADER};
use uuid::Uuid;
use validator::Validate;

/// `x-stale-scopes` response header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleScopes(pub Vec<ScopeKey>);

impl From<&Mutation> for StaleScopes {
    fn from(mutation: &Mutation) -> Self {
        let scopes = mutation.affected_scopes();
        tracing::debug!(?mutation, scopes = %ScopeKey::join(&scopes), "Scopes invalidated");
        StaleScopes(scopes)
    }
}

impl IntoResponseParts for StaleScopes {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        let joined = ScopeKey::join(&self.0);
        match HeaderValue::from_str(&joined) {
            Ok(value) => {
                res.headers_mut().insert(STALE_SCOPES_HEADER, value);
            }
            // Non-ASCII user ids cannot travel in a header; clients fall back to polling
            Err(_) => tracing::warn!(scopes = %joined, "Scope keys are not a valid header value"),
        }
        Ok(res)
    }
}

/// Body naming a single entity by id
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct TargetRequest {
    pub target_id: Uuid,
}
