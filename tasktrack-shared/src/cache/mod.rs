/// Response cache
///
/// Successful `GET` responses are stored as raw JSON bytes under a key built
/// from the caller, the method and the request path (see [`keys`]). Mutating
/// handlers delete the affected keys explicitly; everything else expires by
/// TTL.
///
/// The cache is best-effort. [`ResponseCache`] never returns a backend error
/// to its caller: failures are logged at `warn` and treated as a miss, so an
/// unreachable Redis degrades the API to pass-through instead of failing
/// requests.
///
/// # Backends
///
/// - [`RedisCache`]: Redis via a lazily connected `ConnectionManager`
/// - [`MemoryCache`]: in-process TTL map
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tasktrack_shared::cache::{keys, MemoryCache, ResponseCache};
/// use uuid::Uuid;
///
/// # async fn example() {
/// let cache = ResponseCache::new(Arc::new(MemoryCache::new()), Duration::from_secs(60));
/// let key = keys::task_list_key(Uuid::new_v4());
///
/// cache.put(&key, b"[]".to_vec()).await;
/// assert_eq!(cache.get(&key).await.as_deref(), Some(&b"[]"[..]));
///
/// cache.invalidate(&[key.clone()]).await;
/// assert!(cache.get(&key).await.is_none());
/// # }
/// ```

pub mod keys;
pub mod memory;
pub mod redis;

pub use memory::MemoryCache;
pub use self::redis::{RedisCache, RedisConfig};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default time-to-live for cached responses
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Cache backend errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Could not reach the backend
    #[error("Cache connection error: {0}")]
    Connection(String),

    /// Backend rejected or failed a command
    #[error("Cache command error: {0}")]
    Command(String),

    /// Command did not finish in time
    #[error("Cache command timed out")]
    Timeout,
}

/// Key-value storage with per-entry expiry
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Returns the stored value if present and not expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key` for `ttl`
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Removes every listed key; missing keys are ignored
    async fn delete(&self, keys: &[String]) -> Result<(), CacheError>;

    /// Checks that the backend is reachable
    async fn ping(&self) -> Result<(), CacheError>;
}

/// Reachability of the cache as reported by `/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Disabled,
    Healthy,
    Unavailable,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Disabled => "disabled",
            CacheStatus::Healthy => "healthy",
            CacheStatus::Unavailable => "unavailable",
        }
    }
}

/// Error-swallowing front for a [`CacheBackend`]
///
/// Cloning is cheap; the backend is shared.
#[derive(Clone)]
pub struct ResponseCache {
    backend: Option<Arc<dyn CacheBackend>>,
    ttl: Duration,
}

impl ResponseCache {
    /// Cache writing through `backend` with entries living for `ttl`
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self {
            backend: Some(backend),
            ttl,
        }
    }

    /// Cache that stores nothing and never hits
    pub fn disabled() -> Self {
        Self {
            backend: None,
            ttl: DEFAULT_TTL,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Looks up `key`; backend failures count as a miss
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let backend = self.backend.as_ref()?;

        match backend.get(key).await {
            Ok(Some(value)) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(key, "Cache miss");
                None
            }
            Err(e) => {
                warn!(error = %e, key, backend = backend.name(), "Cache read failed");
                None
            }
        }
    }

    /// Stores `value` under `key` with the configured TTL
    pub async fn put(&self, key: &str, value: Vec<u8>) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };

        if let Err(e) = backend.set(key, value, self.ttl).await {
            warn!(error = %e, key, backend = backend.name(), "Cache write failed");
        }
    }

    /// Deletes `keys`
    pub async fn invalidate(&self, keys: &[String]) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        if keys.is_empty() {
            return;
        }

        match backend.delete(keys).await {
            Ok(()) => debug!(?keys, "Cache invalidated"),
            Err(e) => warn!(error = %e, ?keys, backend = backend.name(), "Cache invalidation failed"),
        }
    }

    /// Pings the backend
    pub async fn status(&self) -> CacheStatus {
        match self.backend.as_ref() {
            None => CacheStatus::Disabled,
            Some(backend) => match backend.ping().await {
                Ok(()) => CacheStatus::Healthy,
                Err(e) => {
                    warn!(error = %e, backend = backend.name(), "Cache health check failed");
                    CacheStatus::Unavailable
                }
            },
        }
    }
}
