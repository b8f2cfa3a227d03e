//! # TaskTrack API Server Library
//!
//! Router, middleware and handlers for the TaskTrack REST API. The binary in
//! `main.rs` wires these to PostgreSQL and Redis; tests wire them to the
//! in-memory store and cache.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors and input normalization
//! - `middleware`: Security headers, rate limiting, response cache
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
