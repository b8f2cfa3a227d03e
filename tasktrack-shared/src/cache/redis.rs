/// Redis cache backend
///
/// The connection is opened on first use rather than at startup, so the API
/// boots even when Redis is down. `ConnectionManager` then reconnects on its
/// own after a dropped connection. After a failed connect attempt further
/// attempts are suppressed for [`RedisConfig::retry_backoff_secs`] so that a
/// dead Redis does not add a connect timeout to every request.
///
/// Every command is bounded by [`RedisConfig::command_timeout_secs`].

use ::redis::aio::ConnectionManager;
use ::redis::{Client, RedisError};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::{timeout, Instant};
use tracing::{info, warn};

use super::{CacheBackend, CacheError};

/// Redis connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    /// `redis://[user:pass@]host:port[/db]`
    pub url: String,

    /// Bound on establishing the connection
    pub connect_timeout_secs: u64,

    /// Bound on each command
    pub command_timeout_secs: u64,

    /// Quiet period after a failed connect
    pub retry_backoff_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout_secs: 2,
            command_timeout_secs: 1,
            retry_backoff_secs: 5,
        }
    }
}

impl From<RedisError> for CacheError {
    fn from(err: RedisError) -> Self {
        if err.is_timeout() {
            CacheError::Timeout
        } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            CacheError::Connection(err.to_string())
        } else {
            CacheError::Command(err.to_string())
        }
    }
}

/// Cache stored in Redis with `SETEX`
pub struct RedisCache {
    client: Client,
    config: RedisConfig,
    connection: OnceCell<ConnectionManager>,
    last_failure: Mutex<Option<Instant>>,
}

impl RedisCache {
    /// Validates the URL; does not connect
    pub fn new(config: RedisConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| CacheError::Connection(format!("Invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            config,
            connection: OnceCell::new(),
            last_failure: Mutex::new(None),
        })
    }

    fn in_backoff(&self) -> bool {
        let backoff = Duration::from_secs(self.config.retry_backoff_secs);
        match self.last_failure.lock() {
            Ok(guard) => guard.is_some_and(|at| at.elapsed() < backoff),
            Err(_) => false,
        }
    }

    fn record_failure(&self) {
        if let Ok(mut guard) = self.last_failure.lock() {
            *guard = Some(Instant::now());
        }
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        if let Some(conn) = self.connection.get() {
            return Ok(conn.clone());
        }
        if self.in_backoff() {
            return Err(CacheError::Connection("reconnect suppressed after recent failure".to_string()));
        }

        let connect_timeout = Duration::from_secs(self.config.connect_timeout_secs);
        let result = self
            .connection
            .get_or_try_init(|| async {
                let manager = timeout(connect_timeout, ConnectionManager::new(self.client.clone()))
                    .await
                    .map_err(|_| CacheError::Timeout)??;
                info!(url = %sanitize_url(&self.config.url), "Connected to Redis");
                Ok::<_, CacheError>(manager)
            })
            .await;

        match result {
            Ok(conn) => Ok(conn.clone()),
            Err(e) => {
                warn!(error = %e, url = %sanitize_url(&self.config.url), "Redis connect failed");
                self.record_failure();
                Err(e)
            }
        }
    }

    async fn run<T, F, Fut>(&self, op: F) -> Result<T, CacheError>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: std::future::Future<Output = Result<T, RedisError>>,
    {
        let conn = self.connection().await?;
        let limit = Duration::from_secs(self.config.command_timeout_secs);

        Ok(timeout(limit, op(conn)).await.map_err(|_| CacheError::Timeout)??)
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.run(|mut conn| async move {
            let value: Option<Vec<u8>> = ::redis::cmd("GET").arg(key).query_async(&mut conn).await?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let seconds = ttl.as_secs().max(1);
        self.run(|mut conn| async move {
            let _: () = ::redis::cmd("SETEX")
                .arg(key)
                .arg(seconds)
                .arg(value)
                .query_async(&mut conn)
                .await?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        self.run(|mut conn| async move {
            let _: i64 = ::redis::cmd("DEL").arg(keys).query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let pong: String = self
            .run(|mut conn| async move { ::redis::cmd("PING").query_async(&mut conn).await })
            .await?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Command(format!("unexpected PING reply: {}", pong)))
        }
    }
}

/// Replaces credentials in a Redis URL for logging
fn sanitize_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}***@{}", &url[..scheme_end + 3], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
