// =============================================================================
// Feed Controller — Simulated WebSocket connection and refresh cadences
// =============================================================================
//
// Owns the connected flag and the periodic tasks that keep the dashboard
// moving:
//
//   - ticker  (every `ticker_units`):  chart + order book + one TRADE line
//   - price   (every `price_units`):   fresh price quote
//   - latency (every `latency_units`): latency readout, runs regardless of
//     connection state
//
// Ticker and price only exist while connected. Every connect/disconnect
// bumps the session epoch; a task only applies its effect while holding the
// gate's read lock and seeing its own epoch, so nothing becomes visible after
// `disconnect` returns even if a tick was already queued.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::app_state::DashboardState;
use crate::types::{Category, ConnectionStatus};

#[derive(Debug, Default)]
struct Gate {
    connected: bool,
    epoch: u64,
}

impl Gate {
    fn is_current(&self, epoch: u64) -> bool {
        self.connected && self.epoch == epoch
    }
}

#[derive(Default)]
struct FeedTasks {
    ticker: Option<JoinHandle<()>>,
    price: Option<JoinHandle<()>>,
    latency: Option<JoinHandle<()>>,
}

impl FeedTasks {
    fn abort_feed(&mut self) {
        for handle in [self.ticker.take(), self.price.take()].into_iter().flatten() {
            handle.abort();
        }
    }
}

/// One per dashboard session. Must be driven from inside a tokio runtime.
pub struct FeedController {
    state: Arc<DashboardState>,
    gate: Arc<RwLock<Gate>>,
    tasks: Mutex<FeedTasks>,
}

impl FeedController {
    pub fn new(state: Arc<DashboardState>) -> Self {
        Self {
            state,
            gate: Arc::new(RwLock::new(Gate::default())),
            tasks: Mutex::new(FeedTasks::default()),
        }
    }

    pub fn dashboard(&self) -> &Arc<DashboardState> {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.gate.read().connected
    }

    pub fn epoch(&self) -> u64 {
        self.gate.read().epoch
    }

    /// Page-ready initialisation: start the latency readout, connect, and
    /// paint a first chart and order book.
    pub fn start(&self) {
        self.start_latency();
        self.connect();
        self.state.refresh_chart();
        self.state.refresh_order_book();
    }

    /// Start (or restart) the ticker and price cadences. Existing cadences
    /// are cancelled first, so repeated calls never stack timers.
    pub fn connect(&self) {
        let mut tasks = self.tasks.lock();
        tasks.abort_feed();

        let epoch = {
            let mut gate = self.gate.write();
            gate.epoch += 1;
            gate.connected = true;
            gate.epoch
        };

        self.state.set_status(ConnectionStatus::Connected);
        self.state.log(Category::System, "WebSocket connected successfully");

        let config = &self.state.config;
        tasks.ticker = Some(self.spawn_gated(config.ticker_interval(), epoch, |state| {
            state.refresh_chart();
            state.refresh_order_book();
            state.print_trade();
        }));
        tasks.price = Some(self.spawn_gated(config.price_interval(), epoch, |state| {
            state.refresh_price();
        }));

        info!(
            epoch,
            ticker_ms = config.ticker_interval().as_millis() as u64,
            price_ms = config.price_interval().as_millis() as u64,
            "feed connected"
        );
    }

    /// Stop the ticker and price cadences. Safe to call while disconnected.
    pub fn disconnect(&self) {
        // Same order as `connect`: tasks lock first, held until status and
        // log agree with the gate.
        let mut tasks = self.tasks.lock();
        let epoch = {
            let mut gate = self.gate.write();
            gate.epoch += 1;
            gate.connected = false;
            gate.epoch
        };
        tasks.abort_feed();

        self.state.set_status(ConnectionStatus::Disconnected);
        self.state.log(Category::System, "WebSocket disconnected");

        info!(epoch, "feed disconnected");
    }

    /// Start the latency readout once. Later calls are no-ops.
    pub fn start_latency(&self) {
        let mut tasks = self.tasks.lock();
        if tasks.latency.is_some() {
            return;
        }

        let state = self.state.clone();
        let period = state.config.latency_interval();
        tasks.latency = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                state.refresh_latency();
            }
        }));
        debug!(period_ms = period.as_millis() as u64, "latency readout started");
    }

    /// Abort every cadence, including the latency readout.
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock();
        {
            let mut gate = self.gate.write();
            gate.epoch += 1;
            gate.connected = false;
        }
        tasks.abort_feed();
        if let Some(handle) = tasks.latency.take() {
            handle.abort();
        }
        info!("feed shut down");
    }

    fn spawn_gated<F>(&self, period: Duration, epoch: u64, mut on_tick: F) -> JoinHandle<()>
    where
        F: FnMut(&DashboardState) + Send + 'static,
    {
        let state = self.state.clone();
        let gate = self.gate.clone();
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let live = {
                    let gate = gate.read();
                    if gate.is_current(epoch) {
                        on_tick(&state);
                        true
                    } else {
                        false
                    }
                };
                if !live {
                    debug!(epoch, "stale feed tick dropped");
                    break;
                }
            }
        })
    }
}

impl Drop for FeedController {
    fn drop(&mut self) {
        let tasks = self.tasks.get_mut();
        tasks.abort_feed();
        if let Some(handle) = tasks.latency.take() {
            handle.abort();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime_config::RuntimeConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const UNIT: u64 = 1000;

    fn controller() -> FeedController {
        let state = DashboardState::with_rng(RuntimeConfig::default(), StdRng::seed_from_u64(1));
        FeedController::new(Arc::new(state))
    }

    async fn advance_units(units: f64) {
        tokio::time::sleep(Duration::from_millis((units * UNIT as f64) as u64)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn price_then_ticker_fire_on_their_cadence() {
        let feed = controller();
        let state = feed.dashboard().clone();
        feed.connect();
        assert_eq!(state.console_len(), 1);

        advance_units(2.5).await;
        let stats = state.stats.snapshot();
        assert_eq!(stats.price_updates, 1);
        assert_eq!(stats.chart_updates, 0);
        assert_eq!(state.console_len(), 1);

        advance_units(1.0).await;
        let stats = state.stats.snapshot();
        assert_eq!(stats.price_updates, 1);
        assert_eq!(stats.chart_updates, 1);
        assert_eq!(stats.book_updates, 1);
        assert_eq!(state.console_len(), 2);

        let entries = state.console_entries();
        assert_eq!(entries[0].category, Category::Trade);
        assert!(entries[0].text.starts_with("MEBL: 1125"));
        assert_eq!(entries[1].text, "WebSocket connected successfully");
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_right_after_connect_freezes_the_feed() {
        let feed = controller();
        let state = feed.dashboard().clone();
        feed.connect();
        feed.disconnect();
        assert!(!feed.is_connected());

        advance_units(10.5).await;
        let entries = state.console_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "WebSocket disconnected");
        assert_eq!(entries[1].text, "WebSocket connected successfully");
        let stats = state.stats.snapshot();
        assert_eq!(stats.price_updates, 0);
        assert_eq!(stats.chart_updates, 0);
        assert_eq!(*state.status.read(), ConnectionStatus::Disconnected);
    }

    /// Both calls queue on the tasks lock while a third party holds it, then
    /// race once it is released. Whichever wins last, the gate, the status,
    /// the ticker handle and the newest console line must tell one story.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn interleaved_connect_and_disconnect_stay_consistent() {
        let runtime = tokio::runtime::Handle::current();
        for _ in 0..25 {
            let feed = Arc::new(controller());
            let state = feed.dashboard().clone();
            feed.connect();

            let held = feed.tasks.lock();
            let spawn_call = |call: fn(&FeedController)| {
                let feed = feed.clone();
                let runtime = runtime.clone();
                std::thread::spawn(move || {
                    let _guard = runtime.enter();
                    call(&feed);
                })
            };
            let disconnecting = spawn_call(FeedController::disconnect);
            std::thread::sleep(Duration::from_millis(2));
            let connecting = spawn_call(FeedController::connect);
            std::thread::sleep(Duration::from_millis(2));
            drop(held);
            disconnecting.join().unwrap();
            connecting.join().unwrap();

            let connected = feed.is_connected();
            let status = *state.status.read();
            let (ticker_live, price_live) = {
                let tasks = feed.tasks.lock();
                (tasks.ticker.is_some(), tasks.price.is_some())
            };
            let newest = state.console_entries()[0].text.clone();

            assert_eq!(status == ConnectionStatus::Connected, connected);
            assert_eq!(ticker_live, connected);
            assert_eq!(price_live, connected);
            let expected = if connected {
                "WebSocket connected successfully"
            } else {
                "WebSocket disconnected"
            };
            assert_eq!(newest, expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_clears_every_handle() {
        let feed = controller();
        feed.start_latency();
        feed.connect();
        feed.shutdown();
        assert!(!feed.is_connected());
        let tasks = feed.tasks.lock();
        assert!(tasks.ticker.is_none());
        assert!(tasks.price.is_none());
        assert!(tasks.latency.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_connect_keeps_one_cadence_per_task() {
        let feed = controller();
        let state = feed.dashboard().clone();
        feed.connect();
        feed.connect();
        feed.connect();

        advance_units(6.5).await;
        let stats = state.stats.snapshot();
        assert_eq!(stats.price_updates, 3);
        assert_eq!(stats.chart_updates, 2);
        assert_eq!(stats.trades_printed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_when_idle_is_harmless() {
        let feed = controller();
        let state = feed.dashboard().clone();
        feed.disconnect();
        feed.disconnect();
        assert_eq!(state.console_len(), 2);
        assert!(!feed.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_resumes_after_disconnect() {
        let feed = controller();
        let state = feed.dashboard().clone();
        feed.connect();
        advance_units(2.5).await;
        feed.disconnect();
        advance_units(5.0).await;
        assert_eq!(state.stats.snapshot().price_updates, 1);

        feed.connect();
        advance_units(2.5).await;
        assert_eq!(state.stats.snapshot().price_updates, 2);
        assert!(feed.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_epoch_tick_is_dropped() {
        let feed = controller();
        let state = feed.dashboard().clone();
        // A task from an outdated session must not apply its effect.
        let handle = feed.spawn_gated(Duration::from_millis(UNIT), 0, |s| s.refresh_price());
        advance_units(1.5).await;
        assert!(handle.is_finished());
        assert_eq!(state.stats.snapshot().price_updates, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_runs_regardless_of_connection() {
        let feed = controller();
        let state = feed.dashboard().clone();
        feed.start_latency();
        feed.start_latency();

        advance_units(3.5).await;
        assert_eq!(state.stats.snapshot().latency_updates, 3);
        let ms = state.latency_ms.read().unwrap();
        assert!((8..=22).contains(&ms));
    }

    #[tokio::test(start_paused = true)]
    async fn start_paints_initial_snapshots() {
        let feed = controller();
        let state = feed.dashboard().clone();
        feed.start();
        assert!(feed.is_connected());
        assert_eq!(state.chart.read().bars.len(), 30);
        assert_eq!(state.order_book.read().bids.len(), 5);

        feed.shutdown();
        let before = state.stats.snapshot();
        advance_units(10.0).await;
        assert_eq!(state.stats.snapshot(), before);
    }
}
