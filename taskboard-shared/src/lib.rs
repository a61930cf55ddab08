//! # Taskboard Shared Library
//!
//! Data model, entity store, board services and sync contract shared by the
//! Taskboard API server and the board poller.
//!
//! ## Module Organization
//!
//! - `store`: entity store contract with in-memory and PostgreSQL backends
//! - `models`: typed records (users, projects, memberships, tasks, events, comments)
//! - `services`: membership, task lifecycle, comment, event and user services
//! - `sync`: scope keys, poll policy and the client-side scope cache
//! - `auth`: sessions, token validation and authorization checks
//! - `db`: PostgreSQL pool and migrations
//! - `error`: service error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod sync;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
