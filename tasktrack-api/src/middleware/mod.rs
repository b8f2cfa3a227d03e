/// Middleware modules for the API server
///
/// - `security`: browser-hardening response headers
/// - `rate_limit`: per-client token bucket
/// - `cache`: read-through response cache for authenticated GETs

pub mod cache;
pub mod rate_limit;
pub mod security;
