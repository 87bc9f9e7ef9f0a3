//! reverie-relay entry point.
//!
//! Startup order:
//! 1. Load configuration from environment variables.
//! 2. Initialise structured tracing.
//! 3. Wire the HTTP collaborators into shared state.
//! 4. Serve the router with graceful shutdown.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reverie_relay::config::RelayConfig;
use reverie_relay::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RelayConfig::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(version = env!("CARGO_PKG_VERSION"), "reverie-relay starting");
    info!(upstream = %config.upstream_url, kv = %config.kv_url, memory = %config.memory_url, "collaborators configured");

    let state = Arc::new(AppState::from_config(&config));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("reverie-relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install shutdown signal handler");
    }
}
