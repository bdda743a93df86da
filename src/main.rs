use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gembot::bot::{self, AppState};
use gembot::config::Config;
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
    info!("Configuration loaded");
    info!("  Model: {}", config.gemini_model);
    info!("  Database: {}", config.db_path.display());

    let store = MessageStore::open(&config.db_path)?;

    let state = Arc::new(AppState::new(config, store)?);

    info!("Bot is starting...");
    bot::run(state).await
}
