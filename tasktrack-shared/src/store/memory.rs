/// In-process [`Store`] used by tests and local experiments
///
/// Mirrors the PostgreSQL schema constraints that the API relies on:
/// unique emails, task owners must exist, and deleting a user cascades to
/// their tasks. Rows are kept in insertion order so that "newest first"
/// listings match `ORDER BY created_at DESC`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, TASKS_OWNER_CONSTRAINT, USERS_EMAIL_CONSTRAINT};
use crate::models::{CreateTask, CreateUser, Role, Task, UpdateTask, UpdateUser, User};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    tasks: Vec<Task>,
}

/// Store holding everything in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    /// Number of stored tasks
    pub async fn task_count(&self) -> usize {
        self.tables.read().await.tasks.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.users.iter().any(|u| u.email == data.email) {
            return Err(StoreError::UniqueViolation(USERS_EMAIL_CONSTRAINT.to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            role: Role::User,
            created_at: Utc::now(),
            last_login: None,
        };
        tables.users.push(user.clone());

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().rev().cloned().collect())
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;

        if let Some(ref email) = data.email {
            if tables.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::UniqueViolation(USERS_EMAIL_CONSTRAINT.to_string()));
            }
        }

        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            data.apply_to(user);
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;

        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        let deleted = tables.users.len() < before;

        if deleted {
            tables.tasks.retain(|t| t.user_id != id);
        }

        Ok(deleted)
    }

    async fn record_login(&self, id: Uuid) -> Result<Option<DateTime<Utc>>, StoreError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.last_login = Some(now);
            now
        }))
    }

    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.users.iter().any(|u| u.id == data.user_id) {
            return Err(StoreError::ForeignKeyViolation(TASKS_OWNER_CONSTRAINT.to_string()));
        }

        let task = Task {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            user_id: data.user_id,
            completed: false,
            due_date: data.due_date,
            created_at: Utc::now(),
        };
        tables.tasks.push(task.clone());

        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks_for_owner(&self, user_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.write().await;

        Ok(tables.tasks.iter_mut().find(|t| t.id == id).map(|task| {
            data.apply_to(task);
            task.clone()
        }))
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;

        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != id);

        Ok(tables.tasks.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            username: "tester".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn new_task(owner: Uuid, title: &str) -> CreateTask {
        CreateTask {
            title: title.to_string(),
            description: String::new(),
            user_id: owner,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_create_user_defaults_to_user_role() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@x.com")).await.unwrap();

        assert_eq!(user.role, Role::User);
        assert!(user.last_login.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_without_new_row() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@x.com")).await.unwrap();

        let err = store.create_user(new_user("a@x.com")).await.unwrap_err();
        assert!(err.is_duplicate_email());
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_user_email_collision() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@x.com")).await.unwrap();
        let b = store.create_user(new_user("b@x.com")).await.unwrap();

        let err = store
            .update_user(
                b.id,
                UpdateUser {
                    email: Some("a@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_duplicate_email());

        // Re-saving your own email is not a collision
        let same = store
            .update_user(
                b.id,
                UpdateUser {
                    email: Some("b@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(same.is_some());
    }

    #[tokio::test]
    async fn test_task_requires_existing_owner() {
        let store = MemoryStore::new();
        let err = store
            .create_task(new_task(Uuid::new_v4(), "orphan"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
        assert_eq!(store.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_list_tasks_newest_first_and_scoped_to_owner() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("a@x.com")).await.unwrap();
        let bob = store.create_user(new_user("b@x.com")).await.unwrap();

        store.create_task(new_task(alice.id, "first")).await.unwrap();
        store.create_task(new_task(bob.id, "bob's")).await.unwrap();
        store.create_task(new_task(alice.id, "second")).await.unwrap();

        let titles: Vec<String> = store
            .list_tasks_for_owner(alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();

        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_delete_user_cascades_tasks() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("a@x.com")).await.unwrap();
        store.create_task(new_task(alice.id, "t")).await.unwrap();

        assert!(store.delete_user(alice.id).await.unwrap());
        assert_eq!(store.task_count().await, 0);
        assert!(!store.delete_user(alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_record_login_sets_timestamp() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("a@x.com")).await.unwrap();

        let stamp = store.record_login(alice.id).await.unwrap();
        assert!(stamp.is_some());

        let reloaded = store.find_user(alice.id).await.unwrap().unwrap();
        assert_eq!(reloaded.last_login, stamp);

        assert!(store.record_login(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_task_returns_none() {
        let store = MemoryStore::new();
        let result = store
            .update_task(
                Uuid::new_v4(),
                UpdateTask {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(result.is_none());
    }
}
