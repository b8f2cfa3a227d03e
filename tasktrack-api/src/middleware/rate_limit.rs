/// Per-client rate limiting
///
/// Token bucket per client IP address, held in process memory.
///
/// # Algorithm
///
/// - Each bucket holds at most `max_requests` tokens and starts full
/// - Tokens refill continuously at `max_requests / window_secs` per second
/// - Each request consumes 1 token
/// - Request rejected with 429 if the bucket is empty
///
/// Buckets idle for longer than a full window are indistinguishable from new
/// ones and are pruned once the table grows past [`PRUNE_THRESHOLD`].
///
/// # Headers
///
/// Every response carries:
/// - `X-RateLimit-Limit`: bucket capacity
/// - `X-RateLimit-Remaining`: tokens left after this request
///
/// 429 responses also carry `Retry-After` (seconds until one token is back).
///
/// The client address comes from axum's `ConnectInfo`; requests without it
/// (in-process tests, unusual transports) share one bucket.

use crate::app::AppState;
use crate::config::RateLimitConfig;
use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Table size above which idle buckets are swept
pub const PRUNE_THRESHOLD: usize = 10_000;

/// Bucket key used when the peer address is unknown
const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(capacity: u32, now: Instant) -> Self {
        Self {
            tokens: f64::from(capacity),
            last_refill: now,
        }
    }

    fn refill(&mut self, rate: f64, capacity: u32, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(f64::from(capacity));
        self.last_refill = now;
    }

    fn try_consume(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn seconds_until_available(&self, rate: f64) -> u64 {
        let deficit = 1.0 - self.tokens;
        if deficit <= 0.0 {
            0
        } else {
            ((deficit / rate).ceil() as u64).max(1)
        }
    }
}

/// Outcome of one rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub allowed: bool,

    /// Bucket capacity
    pub limit: u32,

    /// Whole tokens left
    pub remaining: u32,

    /// Seconds until the next token (0 when allowed)
    pub retry_after: u64,
}

/// In-memory token buckets keyed by client
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    fn refill_rate(&self) -> f64 {
        f64::from(self.config.max_requests) / self.config.window_secs as f64
    }

    /// Consumes one token from `client`'s bucket if available
    pub async fn check(&self, client: &str) -> RateLimitDecision {
        let now = Instant::now();
        let capacity = self.config.max_requests;
        let rate = self.refill_rate();

        let mut buckets = self.buckets.lock().await;

        if buckets.len() > PRUNE_THRESHOLD {
            let window = std::time::Duration::from_secs(self.config.window_secs);
            buckets.retain(|_, b| now.saturating_duration_since(b.last_refill) < window);
        }

        let bucket = buckets
            .entry(client.to_string())
            .or_insert_with(|| TokenBucket::full(capacity, now));
        bucket.refill(rate, capacity, now);

        let allowed = bucket.try_consume();

        RateLimitDecision {
            allowed,
            limit: capacity,
            remaining: bucket.tokens.floor() as u32,
            retry_after: if allowed { 0 } else { bucket.seconds_until_available(rate) },
        }
    }
}

fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn set_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
}

/// Rate limiting middleware layer
///
/// # Errors
///
/// - 429 Too Many Requests: bucket empty
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);
    let decision = state.rate_limiter.check(&client).await;

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        tracing::warn!(client = %client, retry_after = decision.retry_after, "Rate limit exceeded");
        ApiError::RateLimitExceeded {
            retry_after: decision.retry_after,
        }
        .into_response()
    };

    set_limit_headers(response.headers_mut(), &decision);
    response
}
