// =============================================================================
// WebSocket Handler — Push-based dashboard updates
// =============================================================================
//
// Clients connect to `/api/v1/ws` and receive:
//   1. An immediate full StateSnapshot on connect.
//   2. A fresh snapshot every 500 ms whenever the state_version has changed
//      since the last push.
//
// Text frames from the client are dashboard commands (`connect`,
// `disconnect`, `subscribe-market`, ...); anything unrecognised is ignored.
// =============================================================================

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::feed::FeedController;
use crate::samples::SampleKind;
use crate::types::Side;

const PUSH_INTERVAL: Duration = Duration::from_millis(500);

/// Axum handler for the WebSocket upgrade request.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(feed): State<Arc<FeedController>>,
) -> impl IntoResponse {
    info!("WebSocket connection accepted — upgrading");
    ws.on_upgrade(move |socket| handle_ws_connection(socket, feed))
}

// =============================================================================
// Client commands
// =============================================================================

/// Commands a dashboard client may send as a text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Connect,
    Disconnect,
    SubscribeMarket,
    SubscribeOrders,
    ClearConsole,
    OpenOrder(Side),
    CopySample(SampleKind),
    Navigate(String),
}

impl ClientCommand {
    /// `verb` or `verb:arg`, e.g. `copy:quote`, `navigate:orders`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (verb, arg) = match text.split_once(':') {
            Some((v, a)) => (v, Some(a.trim())),
            None => (text, None),
        };
        match (verb, arg) {
            ("connect", None) => Some(Self::Connect),
            ("disconnect", None) => Some(Self::Disconnect),
            ("subscribe-market", None) => Some(Self::SubscribeMarket),
            ("subscribe-orders", None) => Some(Self::SubscribeOrders),
            ("clear", None) => Some(Self::ClearConsole),
            ("buy", None) => Some(Self::OpenOrder(Side::Buy)),
            ("sell", None) => Some(Self::OpenOrder(Side::Sell)),
            ("copy", Some(kind)) => kind.parse().ok().map(Self::CopySample),
            ("navigate", Some(section)) if !section.is_empty() => {
                Some(Self::Navigate(section.to_string()))
            }
            _ => None,
        }
    }

    pub fn apply(&self, feed: &FeedController) {
        let dashboard = feed.dashboard();
        match self {
            Self::Connect => feed.connect(),
            Self::Disconnect => feed.disconnect(),
            Self::SubscribeMarket => dashboard.subscribe_market(),
            Self::SubscribeOrders => dashboard.subscribe_orders(),
            Self::ClearConsole => dashboard.clear_console(),
            Self::OpenOrder(side) => dashboard.open_order_panel(*side),
            Self::CopySample(kind) => {
                dashboard.copy_sample(*kind);
            }
            Self::Navigate(section) => {
                dashboard.scroll_to_section(section);
            }
        }
    }
}

// =============================================================================
// Connection handler
// =============================================================================

/// Manages a single WebSocket connection lifecycle: a push loop and a recv
/// loop multiplexed with `tokio::select!`.
async fn handle_ws_connection(socket: WebSocket, feed: Arc<FeedController>) {
    let dashboard = feed.dashboard().clone();
    dashboard.ws_clients.fetch_add(1, Ordering::Relaxed);
    dashboard.increment_version();

    let (mut sender, mut receiver) = socket.split();
    let mut sequence: u64 = 0;

    if let Err(e) = send_snapshot(&mut sender, &feed, &mut sequence).await {
        warn!(error = %e, "Failed to send initial WebSocket snapshot");
        cleanup(&feed);
        return;
    }
    let mut last_sent_version = dashboard.current_state_version();

    let mut push_interval = interval(PUSH_INTERVAL);

    loop {
        tokio::select! {
            _ = push_interval.tick() => {
                let current_version = dashboard.current_state_version();
                if current_version != last_sent_version {
                    match send_snapshot(&mut sender, &feed, &mut sequence).await {
                        Ok(()) => last_sent_version = current_version,
                        Err(e) => {
                            debug!(error = %e, "WebSocket send failed — disconnecting");
                            break;
                        }
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match ClientCommand::parse(&text) {
                        Some(cmd) => {
                            debug!(command = ?cmd, "WebSocket command received");
                            cmd.apply(&feed);
                        }
                        None => debug!(msg = %text, "WebSocket text ignored"),
                    },
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sender.send(Message::Pong(data)).await {
                            debug!(error = %e, "Failed to send Pong — disconnecting");
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Binary(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        info!("WebSocket Close frame received — disconnecting");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket receive error — disconnecting");
                        break;
                    }
                    None => {
                        info!("WebSocket stream ended (None)");
                        break;
                    }
                }
            }
        }
    }

    cleanup(&feed);
}

// =============================================================================
// Helpers
// =============================================================================

async fn send_snapshot<S>(
    sender: &mut S,
    feed: &FeedController,
    sequence: &mut u64,
) -> Result<(), axum::Error>
where
    S: futures_util::Sink<Message, Error = axum::Error> + Unpin,
{
    let dashboard = feed.dashboard();
    dashboard.ws_sequence_number.fetch_add(1, Ordering::Relaxed);
    *sequence += 1;

    let snapshot = dashboard.build_snapshot();

    match serde_json::to_string(&snapshot) {
        Ok(json) => {
            sender.send(Message::Text(json)).await?;
            debug!(version = snapshot.state_version, seq = *sequence, "WebSocket snapshot sent");
            Ok(())
        }
        Err(e) => {
            // Serialisation errors are not network errors; don't disconnect.
            warn!(error = %e, "Failed to serialize snapshot");
            Ok(())
        }
    }
}

fn cleanup(feed: &FeedController) {
    let dashboard = feed.dashboard();
    dashboard.ws_clients.fetch_sub(1, Ordering::Relaxed);
    dashboard.increment_version();
    info!("WebSocket connection closed — cleanup complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::DashboardState;
    use crate::runtime_config::RuntimeConfig;

    #[test]
    fn parses_plain_and_argument_commands() {
        assert_eq!(ClientCommand::parse("connect"), Some(ClientCommand::Connect));
        assert_eq!(ClientCommand::parse(" sell "), Some(ClientCommand::OpenOrder(Side::Sell)));
        assert_eq!(
            ClientCommand::parse("copy:last-trade"),
            Some(ClientCommand::CopySample(SampleKind::LastTrade))
        );
        assert_eq!(
            ClientCommand::parse("navigate:orders"),
            Some(ClientCommand::Navigate("orders".into()))
        );
    }

    #[test]
    fn rejects_unknown_or_malformed() {
        assert_eq!(ClientCommand::parse("ping"), None);
        assert_eq!(ClientCommand::parse("copy:bogus"), None);
        assert_eq!(ClientCommand::parse("navigate:"), None);
        assert_eq!(ClientCommand::parse("connect:now"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_drive_the_dashboard() {
        let feed = FeedController::new(Arc::new(DashboardState::new(RuntimeConfig::default())));
        ClientCommand::Connect.apply(&feed);
        assert!(feed.is_connected());
        ClientCommand::SubscribeOrders.apply(&feed);
        ClientCommand::Navigate("api".into()).apply(&feed);
        assert_eq!(feed.dashboard().console_len(), 2);
        assert_eq!(feed.dashboard().active_section.read().as_deref(), Some("api"));
        ClientCommand::ClearConsole.apply(&feed);
        assert_eq!(feed.dashboard().console_len(), 0);
        ClientCommand::Disconnect.apply(&feed);
        assert!(!feed.is_connected());
    }

    #[tokio::test]
    async fn pushed_snapshot_carries_its_sequence_number() {
        let feed = FeedController::new(Arc::new(DashboardState::new(RuntimeConfig::default())));
        let mut sent: Vec<Message> = Vec::new();
        let mut local_sequence = 0;
        {
            let mut sink = (&mut sent)
                .sink_map_err(|never: std::convert::Infallible| -> axum::Error { match never {} });
            send_snapshot(&mut sink, &feed, &mut local_sequence).await.unwrap();
            send_snapshot(&mut sink, &feed, &mut local_sequence).await.unwrap();
        }

        assert_eq!(local_sequence, 2);
        assert_eq!(sent.len(), 2);
        let Message::Text(last) = &sent[1] else {
            panic!("expected a text frame");
        };
        let json: serde_json::Value = serde_json::from_str(last).unwrap();
        assert_eq!(json["ws_sequence_number"], 2);
        assert_eq!(feed.dashboard().build_snapshot().ws_sequence_number, 2);
    }
}
