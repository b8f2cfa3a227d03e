/// User administration endpoints
///
/// Every route here sits behind [`admin_only`], so a non-admin caller gets
/// `403 Admin access required` before the body or path is looked at.
///
/// # Endpoints
///
/// - `GET /api/v1/users` - List all users
/// - `PUT /api/v1/users/:id` - Partially update a user
/// - `DELETE /api/v1/users/:id` - Delete a user (not yourself)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{normalize_email, parse_id, trimmed, ApiJson},
};
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasktrack_shared::{
    auth::{authorization, middleware::AuthContext, password},
    cache::keys,
    models::{Role, UpdateUser, User},
    store::{Store, StoreError},
};
use uuid::Uuid;
use validator::Validate;

const USER_NOT_FOUND: &str = "User not found";

/// User as returned by login and user updates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            last_login: user.last_login,
        }
    }
}

/// User list response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub total_members: usize,
    pub users: Vec<User>,
}

/// Update user request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 50, message = "Username must be 2-50 characters"))]
    pub username: Option<String>,

    #[validate(email(message = "Valid email required"))]
    pub email: Option<String>,

    /// `USER` or `ADMIN`; checked by hand so a bad value is a field error
    pub role: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    fn normalized(self) -> Self {
        Self {
            username: self.username.map(trimmed),
            email: self.email.as_deref().map(normalize_email),
            role: self.role,
            password: self.password,
        }
    }

    fn parsed_role(&self) -> ApiResult<Option<Role>> {
        self.role
            .as_deref()
            .map(|raw| {
                raw.parse::<Role>()
                    .map_err(|_| ApiError::invalid_field("role", "Role must be USER or ADMIN"))
            })
            .transpose()
    }
}

/// Update user response
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateUserResponse {
    pub message: String,
    pub user: UserView,
}

/// Plain message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Result of [`bootstrap_admin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminBootstrap {
    /// The account was a USER and is now ADMIN
    Promoted(Uuid),

    /// The account was already ADMIN
    AlreadyAdmin(Uuid),

    /// No account has that email yet
    NoSuchUser,
}

/// Promotes the account registered under `email` to ADMIN
///
/// Runs at startup for `ADMIN_EMAIL`. A missing account is logged and left
/// alone, so the server still starts before the first admin has registered.
pub async fn bootstrap_admin(
    store: &dyn Store,
    email: &str,
) -> Result<AdminBootstrap, StoreError> {
    let Some(user) = store.find_user_by_email(email).await? else {
        tracing::warn!(email = %email, "ADMIN_EMAIL does not match any user yet");
        return Ok(AdminBootstrap::NoSuchUser);
    };

    if user.role == Role::Admin {
        return Ok(AdminBootstrap::AlreadyAdmin(user.id));
    }

    let promoted = store
        .update_user(
            user.id,
            UpdateUser {
                role: Some(Role::Admin),
                ..Default::default()
            },
        )
        .await?;

    // Deleted between the lookup and the update
    if promoted.is_none() {
        tracing::warn!(email = %email, "ADMIN_EMAIL account disappeared before promotion");
        return Ok(AdminBootstrap::NoSuchUser);
    }

    tracing::info!(user_id = %user.id, "Promoted ADMIN_EMAIL account to ADMIN");
    Ok(AdminBootstrap::Promoted(user.id))
}

/// Rejects non-admin callers
///
/// Must run inside the JWT layer; a request without an [`AuthContext`] is
/// treated as unauthenticated.
pub async fn admin_only(request: Request, next: Next) -> Response {
    let Some(auth) = request.extensions().get::<AuthContext>().copied() else {
        return ApiError::Unauthorized("Access token required".to_string()).into_response();
    };

    if let Err(e) = authorization::require_admin(&auth) {
        tracing::debug!(user_id = %auth.user_id, "Admin route refused");
        return ApiError::from(e).into_response();
    }

    next.run(request).await
}

/// List all users
///
/// # Response
///
/// ```json
/// { "totalMembers": 2, "users": [{ "id": "uuid", "username": "al", ... }] }
/// ```
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<UserListResponse>> {
    let users = state.store.list_users().await?;

    Ok(Json(UserListResponse {
        total_members: users.len(),
        users,
    }))
}

/// Update a user
///
/// Only present fields are written. A new password is re-hashed.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, no fields, or email taken
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: User does not exist
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<UpdateUserResponse>> {
    let req = req.normalized();
    req.validate()?;
    let role = req.parsed_role()?;

    let id = parse_id(&id, USER_NOT_FOUND)?;
    if state.store.find_user(id).await?.is_none() {
        return Err(ApiError::NotFound(USER_NOT_FOUND.to_string()));
    }

    let mut update = UpdateUser {
        username: req.username,
        email: req.email,
        role,
        password_hash: None,
    };
    if update.is_empty() && req.password.is_none() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    if let Some(ref email) = update.email {
        if let Some(existing) = state.store.find_user_by_email(email).await? {
            if existing.id != id {
                return Err(ApiError::BadRequest("Email already registered".to_string()));
            }
        }
    }

    if let Some(plaintext) = req.password {
        let hash =
            tokio::task::spawn_blocking(move || password::hash_password(&plaintext)).await??;
        update.password_hash = Some(hash);
    }

    let user = state
        .store
        .update_user(id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

    state.cache.invalidate(&[keys::user_list_key(auth.user_id)]).await;

    tracing::info!(admin_id = %auth.user_id, user_id = %user.id, "User updated");

    Ok(Json(UpdateUserResponse {
        message: "User updated".to_string(),
        user: user.into(),
    }))
}

/// Delete a user and, by cascade, their tasks
///
/// # Errors
///
/// - `400 Bad Request`: Caller tried to delete their own account
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: User does not exist
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, USER_NOT_FOUND)?;

    if id == auth.user_id {
        return Err(ApiError::BadRequest("Cannot delete your own account".to_string()));
    }

    if !state.store.delete_user(id).await? {
        return Err(ApiError::NotFound(USER_NOT_FOUND.to_string()));
    }

    state
        .cache
        .invalidate(&[keys::user_list_key(auth.user_id), keys::task_list_key(id)])
        .await;

    tracing::info!(admin_id = %auth.user_id, user_id = %id, "User deleted");

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
