//! Service variant: the same bot as `gembot`, plus a minimal HTTP health
//! endpoint (`GET /`) reporting the distinct-user count. The endpoint is
//! shut down after the polling loop stops so both halves exit together.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gembot::bot::{self, AppState};
use gembot::config::Config;
use gembot::health;
use gembot::store::MessageStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gembot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let port = config.port;
    info!("Configuration loaded");
    info!("  Model: {}", config.gemini_model);
    info!("  Database: {}", config.db_path.display());
    info!("  Health port: {}", port);

    let store = MessageStore::open(&config.db_path)?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(health::serve(port, store.clone(), shutdown_rx));

    let state = Arc::new(AppState::new(config, store)?);

    info!("Bot is starting...");
    let result = bot::run(state).await;

    // Polling has stopped; take the health endpoint down with it.
    let _ = shutdown_tx.send(());
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Health server exited with error: {:#}", e),
        Err(e) => warn!("Health server task failed: {}", e),
    }

    result
}
