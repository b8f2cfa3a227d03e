/// Task endpoints
///
/// # Endpoints
///
/// - `GET /api/v1/tasks` - List the caller's tasks
/// - `POST /api/v1/tasks` - Create a task
/// - `GET /api/v1/tasks/:id` - Get a task
/// - `PUT /api/v1/tasks/:id` - Partially update a task
/// - `DELETE /api/v1/tasks/:id` - Delete a task
///
/// # Authorization
///
/// A task is visible to its owner and to admins. Checks run in a fixed
/// order: body validation, existence, ownership, then (for updates) the
/// empty-update check.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{parse_id, trimmed, ApiJson},
    routes::users::MessageResponse,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tasktrack_shared::{
    auth::{authorization, middleware::AuthContext},
    cache::keys,
    models::{CreateTask, Task, UpdateTask},
};
use uuid::Uuid;
use validator::Validate;

const TASK_NOT_FOUND: &str = "Task not found";

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    pub description: Option<String>,

    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub due_date: Option<String>,
}

/// Update task request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub completed: Option<bool>,

    /// RFC 3339 timestamp or `YYYY-MM-DD`; null is the same as absent
    pub due_date: Option<String>,
}

/// Parses a due date given as an RFC 3339 timestamp or a bare date
///
/// A bare date means midnight UTC of that day.
pub fn parse_due_date(raw: &str) -> ApiResult<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| ApiError::invalid_field("due_date", "Due date must be an ISO 8601 date"))
}

fn parse_optional_due_date(raw: Option<&str>) -> ApiResult<Option<DateTime<Utc>>> {
    raw.map(parse_due_date).transpose()
}

/// Cache entries that may hold a stale view of `task_id`
fn affected_keys(owner: Uuid, actor: Uuid, task_id: Uuid) -> Vec<String> {
    let mut stale = vec![keys::task_list_key(owner), keys::task_key(owner, task_id)];
    if actor != owner {
        stale.push(keys::task_list_key(actor));
        stale.push(keys::task_key(actor, task_id));
    }
    stale
}

/// Loads a task and checks the caller may touch it
async fn load_accessible(state: &AppState, auth: &AuthContext, raw_id: &str) -> ApiResult<Task> {
    let id = parse_id(raw_id, TASK_NOT_FOUND)?;

    let task = state
        .store
        .find_task(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.to_string()))?;

    authorization::require_task_access(auth, task.user_id)?;

    Ok(task)
}

/// List the caller's tasks, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.store.list_tasks_for_owner(auth.user_id).await?;
    Ok(Json(tasks))
}

/// Create a task owned by the caller
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/tasks
/// Authorization: Bearer <token>
///
/// { "title": "Write report", "description": "Q3", "due_date": "2024-10-01" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Missing or invalid token
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let req = CreateTaskRequest {
        title: trimmed(req.title),
        description: req.description.map(trimmed),
        ..req
    };
    req.validate()?;
    let due_date = parse_optional_due_date(req.due_date.as_deref())?;

    let task = state
        .store
        .create_task(CreateTask {
            title: req.title,
            description: req.description.unwrap_or_default(),
            user_id: auth.user_id,
            due_date,
        })
        .await?;

    state.cache.invalidate(&[keys::task_list_key(auth.user_id)]).await;

    tracing::info!(user_id = %auth.user_id, task_id = %task.id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

/// Get a task by id
///
/// # Errors
///
/// - `403 Forbidden`: Task belongs to someone else
/// - `404 Not Found`: No such task
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let task = load_accessible(&state, &auth, &id).await?;
    Ok(Json(task))
}

/// Update a task
///
/// Only present fields are written.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or no fields to update
/// - `403 Forbidden`: Task belongs to someone else
/// - `404 Not Found`: No such task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let req = UpdateTaskRequest {
        title: req.title.map(trimmed),
        description: req.description.map(trimmed),
        ..req
    };
    req.validate()?;
    let due_date = parse_optional_due_date(req.due_date.as_deref())?;

    let task = load_accessible(&state, &auth, &id).await?;

    let update = UpdateTask {
        title: req.title,
        description: req.description,
        completed: req.completed,
        due_date,
    };
    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let updated = state
        .store
        .update_task(task.id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.to_string()))?;

    state
        .cache
        .invalidate(&affected_keys(task.user_id, auth.user_id, task.id))
        .await;

    tracing::info!(user_id = %auth.user_id, task_id = %task.id, "Task updated");

    Ok(Json(updated))
}

/// Delete a task
///
/// # Errors
///
/// - `403 Forbidden`: Task belongs to someone else
/// - `404 Not Found`: No such task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let task = load_accessible(&state, &auth, &id).await?;

    if !state.store.delete_task(task.id).await? {
        return Err(ApiError::NotFound(TASK_NOT_FOUND.to_string()));
    }

    state
        .cache
        .invalidate(&affected_keys(task.user_id, auth.user_id, task.id))
        .await;

    tracing::info!(user_id = %auth.user_id, task_id = %task.id, "Task deleted");

    Ok(Json(MessageResponse {
        message: "Task deleted".to_string(),
    }))
}
