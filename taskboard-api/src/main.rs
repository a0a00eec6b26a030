//! # Taskboard API Server
//!
//! HTTP API for the task manager: accounts, task CRUD, kanban board,
//! statistics, in-app reminders and email notifications.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskboard-api
//! ```
//!
//! Configuration is read from the environment (and `.env`); see
//! [`taskboard_api::config`].

use taskboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskboard_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use taskboard_shared::redis::{
    cache::TaskCache,
    client::{RedisClient, RedisConfig},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskboard_api=debug,taskboard_shared=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig::new(
        config.database.url.clone(),
        config.database.max_connections,
    ))
    .await?;
    run_migrations(&pool).await?;

    let cache = match config.cache.redis_url.as_deref() {
        Some(url) => match RedisClient::new(RedisConfig::new(url)).await {
            Ok(client) => Some(TaskCache::new(client, config.cache.ttl_secs)),
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, serving without task cache");
                None
            }
        },
        None => {
            tracing::info!("REDIS_URL not set, task cache disabled");
            None
        }
    };

    if !config.email.is_configured() {
        tracing::warn!("SENDGRID_API_KEY not set, email notifications are disabled");
    }
    if config.google_client_id.is_none() {
        tracing::info!("GOOGLE_CLIENT_ID not set, Google sign-in is disabled");
    }

    let bind_address = config.bind_address();
    let mut state = AppState::new(pool.clone(), config);
    if let Some(cache) = cache {
        state = state.with_cache(cache);
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}
