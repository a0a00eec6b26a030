//! # Taskboard Worker
//!
//! Runs the reminder email job once a day.
//!
//! ```bash
//! cargo run -p taskboard-worker
//! ```

use std::sync::Arc;

use taskboard_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use taskboard_shared::email::sendgrid::SendGridMailer;
use taskboard_shared::reminders::job::ReminderJob;
use taskboard_worker::{config::WorkerConfig, scheduler::Scheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskboard_worker=debug,taskboard_shared=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Taskboard Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::from_env()?;

    let pool = create_pool(DatabaseConfig::new(
        config.database_url.clone(),
        config.max_connections,
    ))
    .await?;
    run_migrations(&pool).await?;

    if !config.email.is_configured() {
        tracing::warn!("SENDGRID_API_KEY not set, reminder runs will fail to send");
    }

    let mailer = Arc::new(SendGridMailer::new(config.email.clone()));
    let job = ReminderJob::new(pool.clone(), mailer, config.schedule.offset())
        .with_max_in_flight(config.max_in_flight);

    let scheduler = Scheduler::new(config.schedule, Arc::new(job))
        .with_run_on_startup(config.run_on_startup);

    let token = scheduler.shutdown_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                token.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    scheduler.run().await;

    close_pool(pool).await;
    tracing::info!("Worker stopped");

    Ok(())
}
