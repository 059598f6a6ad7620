//! Esprit Engine host process
//!
//! Opens the database, loads game settings and runs the audit worker until
//! Ctrl+C. Gameplay calls are made in-process through `GameUseCases`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use esprit_engine::infrastructure::config::AppConfig;
use esprit_engine::infrastructure::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "esprit_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Esprit Engine");

    // Load configuration
    let config = AppConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Database: {}", config.database_url);
    tracing::info!("  Lock timeout: {}ms", config.lock_timeout_ms);

    // Initialize application state
    let (state, log_worker) = AppState::new(config).await?;
    tracing::info!("Application state initialized");

    let log_worker = tokio::spawn(log_worker.run());

    tracing::info!("Esprit Engine ready");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, draining transaction log...");

    // Dropping the state closes the audit channel so the worker can finish
    drop(state);
    if let Err(e) = log_worker.await {
        tracing::error!("Transaction log worker failed: {}", e);
    }
    tracing::info!("Stopped");

    Ok(())
}
