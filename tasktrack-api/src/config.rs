/// Configuration management for the API server
///
/// Configuration comes from environment variables; a `.env` file in the
/// working directory is loaded first when present.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 5000)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: HS256 signing secret, at least 32 characters (required)
/// - `JWT_EXPIRATION_SECS`: Token lifetime, at most 30 days (default: 3600)
/// - `CACHE_ENABLED`: Response cache on/off (default: true)
/// - `REDIS_URL`: Cache backend (default: redis://localhost:6379)
/// - `CACHE_TTL_SECS`: Cached response lifetime (default: 60)
/// - `RATE_LIMIT_MAX_REQUESTS`: Requests per window per client (default: 100)
/// - `RATE_LIMIT_WINDOW_SECS`: Window length (default: 900)
/// - `ADMIN_EMAIL`: Account promoted to ADMIN at startup (optional)
/// - `RUST_LOG` / `LOG_FORMAT`: read by `main` for logging
///
/// # Example
///
/// ```no_run
/// use tasktrack_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::fmt;
use std::str::FromStr;

use tasktrack_shared::auth::jwt::DEFAULT_EXPIRATION_SECS;
use tasktrack_shared::db::pool::DatabaseConfig;

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest accepted `JWT_EXPIRATION_SECS` (30 days)
pub const MAX_JWT_EXPIRATION_SECS: i64 = 30 * 24 * 60 * 60;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database pool configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Response cache configuration
    pub cache: CacheConfig,

    /// Per-client rate limiting
    pub rate_limit: RateLimitConfig,

    /// Email of the account to promote to ADMIN on startup
    pub admin_email: Option<String>,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (adds HSTS)
    pub production: bool,
}

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in seconds
    pub expiration_secs: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_secs", &self.expiration_secs)
            .finish()
    }
}

/// Response cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Whether GET responses are cached at all
    pub enabled: bool,

    /// Redis connection URL
    pub redis_url: String,

    /// Lifetime of a cached response in seconds
    pub ttl_secs: u64,
}

/// Rate limit configuration
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Bucket capacity: requests allowed per window
    pub max_requests: u32,

    /// Window length in seconds; the bucket refills fully over one window
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment (and `.env`)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` or `JWT_SECRET` is missing
    /// - `JWT_SECRET` is shorter than 32 characters
    /// - A numeric or boolean variable does not parse
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = get("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            );
        }

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let database = DatabaseConfig {
            url: database_url,
            max_connections: parse_or(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 10)?,
            ..Default::default()
        };

        let rate_limit = RateLimitConfig {
            max_requests: parse_or(get("RATE_LIMIT_MAX_REQUESTS"), "RATE_LIMIT_MAX_REQUESTS", 100)?,
            window_secs: parse_or(get("RATE_LIMIT_WINDOW_SECS"), "RATE_LIMIT_WINDOW_SECS", 900)?,
        };
        if rate_limit.max_requests == 0 || rate_limit.window_secs == 0 {
            anyhow::bail!("RATE_LIMIT_MAX_REQUESTS and RATE_LIMIT_WINDOW_SECS must be positive");
        }

        let expiration_secs: i64 = parse_or(
            get("JWT_EXPIRATION_SECS"),
            "JWT_EXPIRATION_SECS",
            DEFAULT_EXPIRATION_SECS,
        )?;
        if !(1..=MAX_JWT_EXPIRATION_SECS).contains(&expiration_secs) {
            anyhow::bail!(
                "JWT_EXPIRATION_SECS must be between 1 and {}, got {}",
                MAX_JWT_EXPIRATION_SECS,
                expiration_secs
            );
        }

        Ok(Self {
            api: ApiConfig {
                host: get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(get("API_PORT"), "API_PORT", 5000)?,
                cors_origins,
                production: parse_bool(get("PRODUCTION"), "PRODUCTION", false)?,
            },
            database,
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_secs,
            },
            cache: CacheConfig {
                enabled: parse_bool(get("CACHE_ENABLED"), "CACHE_ENABLED", true)?,
                redis_url: get("REDIS_URL").unwrap_or_else(|| "redis://localhost:6379".to_string()),
                ttl_secs: parse_or(get("CACHE_TTL_SECS"), "CACHE_TTL_SECS", 60)?,
            },
            rate_limit,
            admin_email: get("ADMIN_EMAIL").map(|email| email.trim().to_lowercase()),
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_or<T>(value: Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", name, raw, e)),
    }
}

fn parse_bool(value: Option<String>, name: &str, default: bool) -> anyhow::Result<bool> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => anyhow::bail!("{} must be a boolean, got {:?}", name, v),
    }
}
