/// Database models for TaskTrack
///
/// This module contains the database models and their CRUD operations
/// against PostgreSQL. Handlers never call these directly; they go through
/// the [`crate::store::Store`] trait, whose PostgreSQL implementation delegates here.
///
/// # Models
///
/// - `user`: User accounts, roles and login audit
/// - `task`: Tasks owned by users

pub mod task;
pub mod user;

pub use task::{CreateTask, Task, UpdateTask};
pub use user::{CreateUser, Role, UpdateUser, User};
