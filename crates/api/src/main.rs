//! Syncline - external calendar sync service
//!
//! Main entry point: loads configuration, wires the application context,
//! starts the background scheduler, and serves the HTTP API.

use anyhow::Context as _;
use syncline_api::{router, utils, AppContext};
use tracing::info;

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging first so .env loading is visible
    utils::logging::init();

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => info!(error = %err, "no .env file loaded"),
    }

    let config = syncline_infra::config::load().context("failed to load configuration")?;
    let ctx = AppContext::new(config).context("failed to build application context")?;

    // Keep the scheduler alive for the lifetime of the process.
    let _scheduler = ctx.start_scheduler().await.context("failed to start scheduler")?;

    let listen_addr =
        std::env::var("SYNCLINE_LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;
    info!(addr = %listen_addr, "listening");

    axum::serve(listener, router(ctx)).await.context("server error")?;
    Ok(())
}
