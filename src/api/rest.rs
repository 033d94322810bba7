// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Every dashboard button maps to one
// POST endpoint; reads go through `GET /api/v1/state` or the push WebSocket.
//
// CORS is configured permissively; the dashboard is a local demo.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::feed::FeedController;
use crate::samples::SampleKind;
use crate::types::Side;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(feed: Arc<FeedController>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Reads ───────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        .route("/api/v1/state", get(full_state))
        .route("/api/v1/console", get(console))
        // ── Feed control ────────────────────────────────────────────
        .route("/api/v1/feed/connect", post(feed_connect))
        .route("/api/v1/feed/disconnect", post(feed_disconnect))
        .route("/api/v1/subscribe/market", post(subscribe_market))
        .route("/api/v1/subscribe/orders", post(subscribe_orders))
        .route("/api/v1/console/clear", post(console_clear))
        // ── Panels ──────────────────────────────────────────────────
        .route("/api/v1/orders/buy", post(open_buy))
        .route("/api/v1/orders/sell", post(open_sell))
        .route("/api/v1/samples/:kind", get(show_sample))
        .route("/api/v1/samples/:kind/copy", post(copy_sample))
        .route("/api/v1/navigate/:section", post(navigate))
        // ── WebSocket (handled separately in ws module but mounted here) ─
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(feed)
}

// =============================================================================
// Reads
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    connected: bool,
    server_time: i64,
}

async fn health(State(feed): State<Arc<FeedController>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        state_version: feed.dashboard().current_state_version(),
        connected: feed.is_connected(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

async fn full_state(State(feed): State<Arc<FeedController>>) -> impl IntoResponse {
    Json(feed.dashboard().build_snapshot())
}

async fn console(State(feed): State<Arc<FeedController>>) -> impl IntoResponse {
    Json(feed.dashboard().console_entries())
}

// =============================================================================
// Feed control
// =============================================================================

#[derive(Serialize)]
struct FeedResponse {
    connected: bool,
    epoch: u64,
    message: String,
}

fn feed_response(feed: &FeedController, message: &str) -> Json<FeedResponse> {
    Json(FeedResponse {
        connected: feed.is_connected(),
        epoch: feed.epoch(),
        message: message.to_string(),
    })
}

async fn feed_connect(State(feed): State<Arc<FeedController>>) -> impl IntoResponse {
    feed.connect();
    info!("Feed CONNECTED via API");
    feed_response(&feed, "WebSocket connected")
}

async fn feed_disconnect(State(feed): State<Arc<FeedController>>) -> impl IntoResponse {
    feed.disconnect();
    info!("Feed DISCONNECTED via API");
    feed_response(&feed, "WebSocket disconnected")
}

#[derive(Serialize)]
struct ConsoleResponse {
    console_len: usize,
}

fn console_response(feed: &FeedController) -> Json<ConsoleResponse> {
    Json(ConsoleResponse {
        console_len: feed.dashboard().console_len(),
    })
}

async fn subscribe_market(State(feed): State<Arc<FeedController>>) -> impl IntoResponse {
    feed.dashboard().subscribe_market();
    console_response(&feed)
}

async fn subscribe_orders(State(feed): State<Arc<FeedController>>) -> impl IntoResponse {
    feed.dashboard().subscribe_orders();
    console_response(&feed)
}

async fn console_clear(State(feed): State<Arc<FeedController>>) -> impl IntoResponse {
    feed.dashboard().clear_console();
    console_response(&feed)
}

// =============================================================================
// Panels
// =============================================================================

#[derive(Serialize)]
struct OrderPanelResponse {
    side: Side,
    active_section: Option<String>,
}

fn open_panel(feed: &FeedController, side: Side) -> Json<OrderPanelResponse> {
    let dashboard = feed.dashboard();
    dashboard.open_order_panel(side);
    Json(OrderPanelResponse {
        side,
        active_section: dashboard.active_section.read().clone(),
    })
}

async fn open_buy(State(feed): State<Arc<FeedController>>) -> impl IntoResponse {
    open_panel(&feed, Side::Buy)
}

async fn open_sell(State(feed): State<Arc<FeedController>>) -> impl IntoResponse {
    open_panel(&feed, Side::Sell)
}

#[derive(Serialize)]
struct SampleResponse {
    kind: SampleKind,
    payload: &'static str,
    notice: &'static str,
}

fn parse_kind(kind: &str) -> Result<SampleKind, (StatusCode, Json<serde_json::Value>)> {
    kind.parse::<SampleKind>().map_err(|e| {
        warn!(kind = %kind, "unknown sample requested");
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": e })),
        )
    })
}

async fn show_sample(
    State(feed): State<Arc<FeedController>>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let kind = parse_kind(&kind)?;
    let payload = feed.dashboard().show_sample(kind);
    Ok(Json(SampleResponse {
        kind,
        payload,
        notice: crate::app_state::COPY_NOTICE,
    }))
}

async fn copy_sample(
    State(feed): State<Arc<FeedController>>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let kind = parse_kind(&kind)?;
    let payload = feed.dashboard().copy_sample(kind);
    Ok(Json(SampleResponse {
        kind,
        payload,
        notice: crate::app_state::COPY_NOTICE,
    }))
}

#[derive(Serialize)]
struct NavigateResponse {
    section: String,
    found: bool,
}

/// Unknown sections are answered with `found: false`, never an error.
async fn navigate(
    State(feed): State<Arc<FeedController>>,
    Path(section): Path<String>,
) -> impl IntoResponse {
    let found = feed.dashboard().scroll_to_section(&section);
    Json(NavigateResponse { section, found })
}
