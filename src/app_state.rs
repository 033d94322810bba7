// =============================================================================
// Dashboard State — Ticker Deck view state
// =============================================================================
//
// The single source of truth for everything the dashboard shows. The feed
// controller mutates it on its cadences; the REST API and the push
// WebSocket read it through `build_snapshot`.
//
// Thread safety:
//   - Atomic counters for lock-free version and tick tracking.
//   - parking_lot::RwLock for each independently refreshed facet.
//   - A parking_lot::Mutex around the RNG; it is never held while another
//     lock is taken.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::console::{ConsoleEntry, ConsoleLog};
use crate::market_data::{
    generate_chart, generate_latency_ms, generate_order_book, generate_price, generate_trade,
    ChartSnapshot, OrderBookSnapshot, PriceSnapshot, TradePrint, BOOK_LEVELS, CHART_BARS,
};
use crate::render;
use crate::runtime_config::RuntimeConfig;
use crate::samples::SampleKind;
use crate::types::{Category, ConnectionStatus, Side};

/// Confirmation shown after a sample payload is copied.
pub const COPY_NOTICE: &str = "JSON copied to clipboard!";

// =============================================================================
// Feed statistics
// =============================================================================

/// How many times each facet has been regenerated this session.
#[derive(Debug, Default)]
pub struct FeedStats {
    pub price_updates: AtomicU64,
    pub chart_updates: AtomicU64,
    pub book_updates: AtomicU64,
    pub latency_updates: AtomicU64,
    pub trades_printed: AtomicU64,
}

impl FeedStats {
    pub fn snapshot(&self) -> FeedStatsSnapshot {
        FeedStatsSnapshot {
            price_updates: self.price_updates.load(Ordering::Relaxed),
            chart_updates: self.chart_updates.load(Ordering::Relaxed),
            book_updates: self.book_updates.load(Ordering::Relaxed),
            latency_updates: self.latency_updates.load(Ordering::Relaxed),
            trades_printed: self.trades_printed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedStatsSnapshot {
    pub price_updates: u64,
    pub chart_updates: u64,
    pub book_updates: u64,
    pub latency_updates: u64,
    pub trades_printed: u64,
}

// =============================================================================
// DashboardState
// =============================================================================

pub struct DashboardState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Bumped on every visible mutation. The push WebSocket compares it to
    /// decide whether to send a fresh snapshot.
    pub state_version: AtomicU64,

    /// Push WebSocket message sequence number, shared by every client.
    /// Bumped before each snapshot is built, so a pushed snapshot carries
    /// its own sequence number.
    pub ws_sequence_number: AtomicU64,

    /// Open push WebSocket connections.
    pub ws_clients: AtomicU64,

    pub session_id: Uuid,
    pub config: RuntimeConfig,
    rng: Mutex<StdRng>,

    // ── View facets ─────────────────────────────────────────────────────
    pub status: RwLock<ConnectionStatus>,
    pub console: RwLock<ConsoleLog>,
    pub price: RwLock<Option<PriceSnapshot>>,
    pub order_book: RwLock<OrderBookSnapshot>,
    pub chart: RwLock<ChartSnapshot>,
    pub latency_ms: RwLock<Option<u32>>,

    // ── Panels & navigation ─────────────────────────────────────────────
    pub active_section: RwLock<Option<String>>,
    pub order_panel: RwLock<Option<Side>>,
    pub notice: RwLock<Option<String>>,

    pub stats: FeedStats,
    pub start_time: std::time::Instant,
}

impl DashboardState {
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Build with a caller-supplied RNG, e.g. a seeded one in tests.
    pub fn with_rng(config: RuntimeConfig, rng: StdRng) -> Self {
        let console = ConsoleLog::new(config.console_capacity);
        Self {
            state_version: AtomicU64::new(1),
            ws_sequence_number: AtomicU64::new(0),
            ws_clients: AtomicU64::new(0),
            session_id: Uuid::new_v4(),
            config,
            rng: Mutex::new(rng),
            status: RwLock::new(ConnectionStatus::Disconnected),
            console: RwLock::new(console),
            price: RwLock::new(None),
            order_book: RwLock::new(OrderBookSnapshot::default()),
            chart: RwLock::new(ChartSnapshot::default()),
            latency_ms: RwLock::new(None),
            active_section: RwLock::new(None),
            order_panel: RwLock::new(None),
            notice: RwLock::new(None),
            stats: FeedStats::default(),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Console ─────────────────────────────────────────────────────────

    /// Append a console line. Every log call also re-rolls the latency
    /// readout.
    pub fn log(&self, category: Category, text: impl Into<String>) {
        let text = text.into();
        debug!(category = %category, text = %text, "console");
        self.console.write().log(category, text);
        self.refresh_latency();
        self.increment_version();
    }

    pub fn clear_console(&self) {
        self.console.write().clear();
        self.increment_version();
    }

    pub fn console_entries(&self) -> Vec<ConsoleEntry> {
        self.console.read().to_vec()
    }

    pub fn console_len(&self) -> usize {
        self.console.read().len()
    }

    // ── Snapshot regeneration ───────────────────────────────────────────

    pub fn set_status(&self, status: ConnectionStatus) {
        *self.status.write() = status;
        self.increment_version();
    }

    pub fn refresh_price(&self) {
        let params = &self.config.feed;
        let quote = {
            let mut rng = self.rng.lock();
            generate_price(&mut *rng, &self.config.symbol, params.price_min, params.price_max)
        };
        *self.price.write() = Some(quote);
        self.stats.price_updates.fetch_add(1, Ordering::Relaxed);
        self.increment_version();
    }

    pub fn refresh_order_book(&self) {
        let params = &self.config.feed;
        let book = {
            let mut rng = self.rng.lock();
            generate_order_book(&mut *rng, params.book_base, params.book_tick, BOOK_LEVELS)
        };
        *self.order_book.write() = book;
        self.stats.book_updates.fetch_add(1, Ordering::Relaxed);
        self.increment_version();
    }

    pub fn refresh_chart(&self) {
        let chart = {
            let mut rng = self.rng.lock();
            generate_chart(&mut *rng, CHART_BARS)
        };
        *self.chart.write() = chart;
        self.stats.chart_updates.fetch_add(1, Ordering::Relaxed);
        self.increment_version();
    }

    pub fn refresh_latency(&self) {
        let ms = {
            let mut rng = self.rng.lock();
            generate_latency_ms(&mut *rng)
        };
        *self.latency_ms.write() = Some(ms);
        self.stats.latency_updates.fetch_add(1, Ordering::Relaxed);
        self.increment_version();
    }

    /// Print one synthetic trade to the console.
    pub fn print_trade(&self) -> TradePrint {
        let params = &self.config.feed;
        let trade = {
            let mut rng = self.rng.lock();
            generate_trade(&mut *rng, &self.config.symbol, params.price_min, params.price_max)
        };
        self.log(Category::Trade, trade.to_string());
        self.stats.trades_printed.fetch_add(1, Ordering::Relaxed);
        trade
    }

    // ── User actions ────────────────────────────────────────────────────

    pub fn subscribe_market(&self) {
        let symbols = self.config.market_symbols.join(", ");
        self.log(Category::Market, format!("Subscribed to {symbols}"));
    }

    pub fn subscribe_orders(&self) {
        self.log(
            Category::Orders,
            format!("Subscribed to order updates for account {}", self.config.account_id),
        );
    }

    pub fn open_order_panel(&self, side: Side) {
        self.log(
            Category::Trade,
            format!("{side} order panel opened for {}", self.config.symbol),
        );
        *self.order_panel.write() = Some(side);
        self.scroll_to_section("orders");
    }

    /// Log the copy and raise the confirmation notice. Returns the payload.
    pub fn show_sample(&self, kind: SampleKind) -> &'static str {
        self.log(Category::Json, format!("Copied {kind} JSON to clipboard"));
        *self.notice.write() = Some(COPY_NOTICE.to_string());
        self.increment_version();
        kind.payload()
    }

    pub fn copy_sample(&self, kind: SampleKind) -> &'static str {
        self.show_sample(kind)
    }

    /// Mark `id` as the active section. Unknown sections are ignored and
    /// `false` is returned.
    pub fn scroll_to_section(&self, id: &str) -> bool {
        if !self.config.sections.iter().any(|s| s == id) {
            debug!(section = %id, "scroll target not found — skipped");
            return false;
        }
        *self.active_section.write() = Some(id.to_string());
        self.increment_version();
        true
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Serialisable snapshot of the whole dashboard: raw facets plus the
    /// rendered strings the front-end binds.
    pub fn build_snapshot(&self) -> StateSnapshot {
        let now = Utc::now();
        let status = *self.status.read();
        let price = self.price.read().clone();
        let order_book = self.order_book.read().clone();
        let chart = self.chart.read().clone();
        let latency_ms = *self.latency_ms.read();
        let active_section = self.active_section.read().clone();
        let (console, messages_logged, console_capacity) = {
            let log = self.console.read();
            (log.to_vec(), log.total_logged(), log.capacity())
        };

        let view = DashboardView {
            status: render::status(status),
            latency: latency_ms.map(render::latency),
            price: price.as_ref().map(render::price),
            order_book: render::order_book(&order_book),
            chart: render::chart(&chart),
            console: console.iter().map(render::console_line).collect(),
            nav: render::nav_links(&self.config.sections, active_section.as_deref()),
        };

        StateSnapshot {
            state_version: self.current_state_version(),
            server_time: now.timestamp_millis(),
            session_id: self.session_id,
            uptime_s: self.start_time.elapsed().as_secs(),
            symbol: self.config.symbol.clone(),
            status,
            latency_ms,
            price,
            order_book,
            chart,
            console,
            messages_logged,
            console_capacity,
            active_section,
            order_panel: *self.order_panel.read(),
            notice: self.notice.read().clone(),
            ws_clients: self.ws_clients.load(Ordering::Relaxed),
            ws_sequence_number: self.ws_sequence_number.load(Ordering::Relaxed),
            stats: self.stats.snapshot(),
            view,
        }
    }
}

// =============================================================================
// Serialisable snapshot types
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub status: render::StatusView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<render::PriceView>,
    pub order_book: render::BookView,
    pub chart: Vec<render::BarView>,
    pub console: Vec<render::ConsoleLineView>,
    pub nav: Vec<render::NavLinkView>,
}

/// Full dashboard snapshot served by `GET /api/v1/state` and the push feed.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub session_id: Uuid,
    pub uptime_s: u64,
    pub symbol: String,
    pub status: ConnectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceSnapshot>,
    pub order_book: OrderBookSnapshot,
    pub chart: ChartSnapshot,
    pub console: Vec<ConsoleEntry>,
    pub messages_logged: u64,
    pub console_capacity: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_panel: Option<Side>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub ws_clients: u64,
    pub ws_sequence_number: u64,
    pub stats: FeedStatsSnapshot,
    pub view: DashboardView,
}
