/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasktrack_api::{app::AppState, config::Config};
/// use tasktrack_shared::{cache::ResponseCache, db::pool::create_pool, store::PgStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.database.clone()).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), ResponseCache::disabled(), config);
/// let app = tasktrack_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{
        cache::response_cache_layer, rate_limit::rate_limit_layer, rate_limit::RateLimiter,
        security::SecurityHeadersLayer,
    },
    routes,
};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tasktrack_shared::{auth::middleware::authenticate, cache::ResponseCache, store::Store};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Largest accepted request body
pub const BODY_LIMIT_BYTES: usize = 100 * 1024;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is reference-counted, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Users and tasks
    pub store: Arc<dyn Store>,

    /// Read-through response cache (may be disabled)
    pub cache: ResponseCache,

    /// Per-client request budget
    pub rate_limiter: Arc<RateLimiter>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, cache: ResponseCache, config: Config) -> Self {
        Self {
            store,
            cache,
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit)),
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                   # Health check (public)
/// └── /api/v1/
///     ├── /auth/                # Public
///     │   ├── POST /register
///     │   └── POST /login
///     ├── /tasks                # JWT + response cache
///     │   ├── GET  /
///     │   ├── POST /
///     │   ├── GET    /:id
///     │   ├── PUT    /:id
///     │   └── DELETE /:id
///     └── /users                # JWT + admin + response cache
///         ├── GET    /
///         ├── PUT    /:id
///         └── DELETE /:id
/// ```
///
/// Anything else is `404 { "error": "Route not found" }`.
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Rate limiting
/// 4. Logging (tower-http TraceLayer)
/// 5. Body size limit
/// 6. Panic recovery
/// 7. Authentication and caching (per route group)
pub fn build_router(state: AppState) -> Router {
    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/api/v1/auth/register", post(routes::auth::register))
        .route("/api/v1/auth/login", post(routes::auth::login));

    // Route layers wrap only matched routes, so unknown paths fall through
    // to the 404 fallback instead of the auth check.
    let task_routes = Router::new()
        .route(
            "/api/v1/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/api/v1/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route_layer(from_fn_with_state(state.clone(), response_cache_layer))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let user_routes = Router::new()
        .route("/api/v1/users", get(routes::users::list_users))
        .route(
            "/api/v1/users/:id",
            put(routes::users::update_user).delete(routes::users::delete_user),
        )
        .route_layer(from_fn_with_state(state.clone(), response_cache_layer))
        .route_layer(from_fn(routes::users::admin_only))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(auth_routes)
        .merge(task_routes)
        .merge(user_routes)
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(from_fn_with_state(state.clone(), rate_limit_layer))
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Configure CORS based on environment
fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600))
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");

    ApiError::InternalError(format!("Handler panicked: {}", detail)).into_response()
}

/// JWT authentication middleware layer
///
/// Validates the bearer token, then injects [`AuthContext`] into request
/// extensions for the handlers and the cache layer.
///
/// [`AuthContext`]: tasktrack_shared::auth::middleware::AuthContext
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = match authenticate(req.headers(), state.jwt_secret()) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::debug!(error = %e, "Request authentication failed");
            return Err(e.into());
        }
    };

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_panic_response_is_generic_500() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_route_not_found() {
        let response = route_not_found().await.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
