//! # TaskTrack Shared Library
//!
//! Domain types and infrastructure used by the TaskTrack API server.
//!
//! ## Module Organization
//!
//! - `models`: users and tasks, with their sqlx queries
//! - `store`: persistence trait with PostgreSQL and in-memory implementations
//! - `auth`: password hashing, JWT, request identity, authorization predicates
//! - `cache`: best-effort response cache (Redis or in-memory)
//! - `db`: connection pool and migrations

pub mod auth;
pub mod cache;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the TaskTrack shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
