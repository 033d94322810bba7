// =============================================================================
// Ticker Deck — Main Entry Point
// =============================================================================
//
// Serves a simulated brokerage dashboard: a fake market feed regenerates
// price, order book and chart snapshots on fixed cadences, and the REST API
// and push WebSocket expose them to the front-end.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod console;
mod feed;
mod market_data;
mod render;
mod runtime_config;
mod samples;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::DashboardState;
use crate::feed::FeedController;
use crate::runtime_config::RuntimeConfig;

const CONFIG_PATH: &str = "tickerdeck_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Ticker Deck — starting up");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env_overrides();

    info!(
        symbol = %config.symbol,
        time_unit_ms = config.time_unit_ms,
        ticker_units = config.ticker_units,
        price_units = config.price_units,
        latency_units = config.latency_units,
        "Feed configured"
    );

    // ── 2. Shared state & feed ───────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let dashboard = Arc::new(DashboardState::new(config));
    let feed = Arc::new(FeedController::new(dashboard.clone()));
    feed.start();
    info!(session_id = %dashboard.session_id, "Simulated feed running");

    // ── 3. API server ────────────────────────────────────────────────────
    let app = api::router(feed.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    // ── 4. Graceful shutdown ─────────────────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl+C");
            }
            warn!("Shutdown signal received — stopping gracefully");
        })
        .await
        .context("API server failed")?;

    feed.shutdown();

    if let Err(e) = dashboard.config.save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Ticker Deck shut down complete.");
    Ok(())
}
