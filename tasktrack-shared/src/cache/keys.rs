/// Cache key construction
///
/// Format: `cache:{user_id}:{METHOD}:{path and query}`, where the path is the
/// full request path including the `/api/v1` prefix. The helpers below build
/// the exact keys the read-through layer writes for the routes that mutations
/// need to invalidate.

use uuid::Uuid;

/// Versioned prefix every API route lives under
pub const API_PREFIX: &str = "/api/v1";

/// Key for a request made by `user_id`
pub fn response_key(user_id: Uuid, method: &str, path_and_query: &str) -> String {
    format!("cache:{}:{}:{}", user_id, method, path_and_query)
}

/// `GET /api/v1/tasks` as seen by `user_id`
pub fn task_list_key(user_id: Uuid) -> String {
    response_key(user_id, "GET", &format!("{}/tasks", API_PREFIX))
}

/// `GET /api/v1/tasks/{task_id}` as seen by `user_id`
pub fn task_key(user_id: Uuid, task_id: Uuid) -> String {
    response_key(user_id, "GET", &format!("{}/tasks/{}", API_PREFIX, task_id))
}

/// `GET /api/v1/users` as seen by `user_id`
pub fn user_list_key(user_id: Uuid) -> String {
    response_key(user_id, "GET", &format!("{}/users", API_PREFIX))
}
