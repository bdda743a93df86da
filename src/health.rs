use anyhow::{Context, Result};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::info;

use crate::store::MessageStore;

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    users: u64,
}

async fn health(State(store): State<MessageStore>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "running",
        users: store.count_distinct_users().await,
    })
}

fn app(store: MessageStore) -> Router {
    Router::new().route("/", get(health)).with_state(store)
}

/// Serve the health endpoint until the shutdown channel fires.
pub async fn serve(port: u16, store: MessageStore, shutdown: oneshot::Receiver<()>) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Health endpoint listening on {addr}");

    axum::serve(listener, app(store))
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
        })
        .await
        .context("Health server error")?;

    Ok(())
}
