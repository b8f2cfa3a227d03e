/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/auth/register` - Register new user
/// - `POST /api/v1/auth/login` - Login and get a bearer token
///
/// Registration never accepts a role: every new account is `USER`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{normalize_email, trimmed, ApiJson},
    routes::users::UserView,
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tasktrack_shared::{
    auth::{jwt, password},
    models::{CreateUser, Role, User},
};
use uuid::Uuid;
use validator::Validate;

/// Message returned for both unknown email and wrong password
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[serde(default)]
    #[validate(length(min = 2, max = 50, message = "Username must be 2-50 characters"))]
    pub username: String,

    /// Email address
    #[serde(default)]
    #[validate(email(message = "Valid email required"))]
    pub email: String,

    /// Plaintext password
    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

impl RegisterRequest {
    fn normalized(self) -> Self {
        Self {
            username: trimmed(self.username),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

/// Public part of a freshly registered user
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for RegisteredUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: RegisteredUser,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[serde(default)]
    #[validate(email(message = "Valid email required"))]
    pub email: String,

    /// Password
    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// HS256 bearer token
    pub token: String,

    /// The authenticated user
    pub user: UserView,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/register
/// Content-Type: application/json
///
/// { "username": "al", "email": "a@x.com", "password": "longpass1" }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "message": "User registered",
///   "user": { "id": "uuid", "username": "al", "email": "a@x.com", "role": "USER" }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email already registered
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let req = req.normalized();
    req.validate()?;

    if state.store.find_user_by_email(&req.email).await?.is_some() {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let plaintext = req.password;
    let password_hash =
        tokio::task::spawn_blocking(move || password::hash_password(&plaintext)).await??;

    // A concurrent registration can still win the race; the unique
    // constraint turns that into the same 400.
    let user = state
        .store
        .create_user(CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered".to_string(),
            user: user.into(),
        }),
    ))
}

/// Login endpoint
///
/// Verifies the password, stamps `last_login`, and issues a token carrying
/// the user id and role.
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/login
/// Content-Type: application/json
///
/// { "email": "a@x.com", "password": "longpass1" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "token": "eyJ...",
///   "user": { "id": "uuid", "username": "al", "email": "a@x.com", "role": "USER", "last_login": "..." }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Unknown email or wrong password (same message)
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let email = normalize_email(&req.email);
    let req = LoginRequest { email, ..req };
    req.validate()?;

    let plaintext = req.password;

    let Some(mut user) = state.store.find_user_by_email(&req.email).await? else {
        tokio::task::spawn_blocking(move || password::burn_verification(&plaintext)).await?;
        tracing::debug!("Login failed: unknown email");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let stored_hash = user.password_hash.clone();
    let valid =
        tokio::task::spawn_blocking(move || password::verify_password(&plaintext, &stored_hash))
            .await??;

    if !valid {
        tracing::debug!(user_id = %user.id, "Login failed: wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    user.last_login = state.store.record_login(user.id).await?.or(user.last_login);

    let claims = jwt::Claims::new(
        user.id,
        user.role,
        Duration::seconds(state.config.jwt.expiration_secs),
    );
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}
