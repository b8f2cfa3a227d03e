//! # TaskTrack API Server
//!
//! REST API for user accounts and personal task lists.
//!
//! ## Architecture
//!
//! - PostgreSQL for users and tasks (migrations run at startup)
//! - Redis read-through cache for authenticated `GET` responses, optional
//! - JWT bearer authentication with `USER` / `ADMIN` roles
//! - Per-client rate limiting and security headers
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://... JWT_SECRET=... cargo run -p tasktrack-api
//! ```

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tasktrack_api::{
    app::{build_router, AppState},
    config::Config,
    routes::users::bootstrap_admin,
};
use tasktrack_shared::{
    cache::{RedisCache, RedisConfig, ResponseCache},
    db::{migrations::run_migrations, pool},
    store::PgStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "tasktrack_api=debug,tasktrack_shared=debug,tower_http=debug";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_cache(config: &Config) -> ResponseCache {
    if !config.cache.enabled {
        tracing::info!("Response cache disabled");
        return ResponseCache::disabled();
    }

    let redis_config = RedisConfig {
        url: config.cache.redis_url.clone(),
        ..Default::default()
    };

    match RedisCache::new(redis_config) {
        Ok(redis) => ResponseCache::new(Arc::new(redis), Duration::from_secs(config.cache.ttl_secs)),
        Err(e) => {
            tracing::warn!(error = %e, "Invalid Redis configuration, response cache disabled");
            ResponseCache::disabled()
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "TaskTrack API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env().context("Failed to load configuration")?;

    let db = pool::create_pool(config.database.clone())
        .await
        .context("Failed to connect to database")?;
    run_migrations(&db).await.context("Failed to run migrations")?;

    let store = Arc::new(PgStore::new(db.clone()));

    if let Some(ref email) = config.admin_email {
        bootstrap_admin(store.as_ref(), email)
            .await
            .context("Failed to promote ADMIN_EMAIL account")?;
    }

    let cache = build_cache(&config);
    let bind_address = config.bind_address();
    let state = AppState::new(store, cache, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pool::close_pool(db).await;
    tracing::info!("Server stopped");

    Ok(())
}
