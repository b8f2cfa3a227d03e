/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `tasks`: Task CRUD, scoped to the owner (admins see all)
/// - `users`: Admin-only user management

pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;
