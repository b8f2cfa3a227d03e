/// Read-through response cache for authenticated `GET` routes
///
/// Runs inside the auth layer so the caller's [`AuthContext`] is available
/// for the key. On a hit the stored JSON is returned as-is with
/// `x-cache: HIT`; on a miss the handler runs and a `200` body is stored
/// before the response is returned with `x-cache: MISS`.
///
/// The key uses the request's original URI, so the layer still produces
/// full-path keys matching [`tasktrack_shared::cache::keys`] when mounted
/// inside a nested router.

use crate::app::AppState;
use crate::error::ApiError;
use axum::{
    body::{to_bytes, Body},
    extract::{OriginalUri, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tasktrack_shared::{auth::middleware::AuthContext, cache::keys};

/// Name of the hit/miss marker header
pub const X_CACHE: &str = "x-cache";

fn cache_key(request: &Request, auth: &AuthContext) -> String {
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri)
        .unwrap_or_else(|| request.uri());

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    keys::response_key(auth.user_id, request.method().as_str(), path_and_query)
}

fn hit_response(body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::HeaderName::from_static(X_CACHE), HeaderValue::from_static("HIT")),
        ],
        body,
    )
        .into_response()
}

/// Response cache middleware layer
pub async fn response_cache_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET || !state.cache.is_enabled() {
        return next.run(request).await;
    }

    let Some(auth) = request.extensions().get::<AuthContext>().copied() else {
        return next.run(request).await;
    };

    let key = cache_key(&request, &auth);

    if let Some(body) = state.cache.get(&key).await {
        return hit_response(body);
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return ApiError::InternalError(format!("Failed to buffer response body: {}", e))
                .into_response();
        }
    };

    state.cache.put(&key, bytes.to_vec()).await;

    parts
        .headers
        .insert(header::HeaderName::from_static(X_CACHE), HeaderValue::from_static("MISS"));
    Response::from_parts(parts, Body::from(bytes))
}
