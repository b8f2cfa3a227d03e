/// Health check endpoint
///
/// Reports whether the process can reach its backing services:
/// - Database connectivity (`connected` / `disconnected`)
/// - Response cache state (`disabled` / `healthy` / `unavailable`)
///
/// The service is `degraded` when the database is unreachable or an enabled
/// cache does not answer. The endpoint itself always returns 200.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "cache": "healthy"
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tasktrack_shared::cache::CacheStatus;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,

    /// Response cache status
    pub cache: String,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ok = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            false
        }
    };

    let cache = state.cache.status().await;
    let healthy = database_ok && cache != CacheStatus::Unavailable;

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if database_ok { "connected" } else { "disconnected" }.to_string(),
        cache: cache.as_str().to_string(),
    })
}
