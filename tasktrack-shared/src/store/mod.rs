/// Persistence abstraction over the credential and task stores
///
/// Route handlers talk to a `dyn Store` so that the same request pipeline
/// runs against PostgreSQL in production and against an in-process store in
/// tests.
///
/// # Implementations
///
/// - [`PgStore`]: PostgreSQL via sqlx, delegating to the model functions
/// - [`MemoryStore`]: tokio `RwLock`-guarded tables, same constraints
///
/// Neither implementation wraps multi-statement sequences in a transaction;
/// callers that check-then-write accept the race between the two steps.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tasktrack_shared::store::{MemoryStore, Store};
/// use tasktrack_shared::models::CreateUser;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// let user = store.create_user(CreateUser {
///     username: "alice".to_string(),
///     email: "alice@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// assert!(store.find_user(user.id).await?.is_some());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{CreateTask, CreateUser, Task, UpdateTask, UpdateUser, User};

/// Name of the unique constraint on `users.email`
pub const USERS_EMAIL_CONSTRAINT: &str = "users_email_key";

/// Name of the foreign key from `tasks.user_id` to `users.id`
pub const TASKS_OWNER_CONSTRAINT: &str = "tasks_user_id_fkey";

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A foreign key rejected the write
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    /// Whether this error is the duplicate-email constraint
    pub fn is_duplicate_email(&self) -> bool {
        matches!(self, StoreError::UniqueViolation(c) if c == USERS_EMAIL_CONSTRAINT)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => {
                    return StoreError::UniqueViolation(constraint);
                }
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    return StoreError::ForeignKeyViolation(constraint);
                }
                _ => {}
            }
        }

        StoreError::Database(err)
    }
}

/// Storage operations required by the API
#[async_trait]
pub trait Store: Send + Sync {
    /// Verifies the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Inserts a user with role `USER`
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError>;

    /// Fetches a user by id
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Fetches a user by (normalized) email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// All users, newest first
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Writes the present fields; None if the user does not exist
    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError>;

    /// Removes a user and their tasks; false if the user did not exist
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Stamps `last_login` with the current time and returns it
    async fn record_login(&self, id: Uuid) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Inserts a task; fails if the owner does not exist
    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError>;

    /// Fetches a task by id
    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Tasks owned by `user_id`, newest first
    async fn list_tasks_for_owner(&self, user_id: Uuid) -> Result<Vec<Task>, StoreError>;

    /// Writes the present fields; None if the task does not exist
    async fn update_task(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError>;

    /// Removes a task; false if it did not exist
    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError>;
}
