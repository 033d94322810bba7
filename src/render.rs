// =============================================================================
// View Rendering — Display strings for the dashboard widgets
// =============================================================================
//
// Pure formatting over snapshots. Nothing here touches shared state, so the
// dashboard front-end can bind these strings directly.
// =============================================================================

use serde::Serialize;

use crate::console::ConsoleEntry;
use crate::market_data::{BookLevel, ChartSnapshot, OrderBookSnapshot, PriceSnapshot};
use crate::types::{ConnectionStatus, Direction};

const GREEN: &str = "#0ECB81";
const RED: &str = "#F6465D";

#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub led_class: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceView {
    pub price: String,
    pub change: String,
    pub change_class: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookRowView {
    pub price: String,
    pub size: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookView {
    pub bids: Vec<BookRowView>,
    pub asks: Vec<BookRowView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BarView {
    pub left_px: u32,
    pub height_px: u32,
    pub width_px: u32,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsoleLineView {
    pub time: String,
    pub category: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavLinkView {
    pub href: String,
    pub active: bool,
}

pub fn status(status: ConnectionStatus) -> StatusView {
    match status {
        ConnectionStatus::Connected => StatusView {
            led_class: "ws-led connected",
            text: "WEBSOCKET CONNECTED",
        },
        ConnectionStatus::Disconnected => StatusView {
            led_class: "ws-led",
            text: "WEBSOCKET DISCONNECTED",
        },
    }
}

pub fn latency(ms: u32) -> String {
    format!("{ms}ms")
}

/// `▲ 0.25 (1.01%)` style quote line.
pub fn price(quote: &PriceSnapshot) -> PriceView {
    let change_class = match quote.direction {
        Direction::Up => "price-change positive",
        Direction::Down => "price-change negative",
    };
    PriceView {
        price: format!("{:.2}", quote.price),
        change: format!(
            "{} {:.2} ({:.2}%)",
            quote.direction.arrow(),
            quote.change.abs(),
            quote.change_percent
        ),
        change_class,
    }
}

fn book_row(level: &BookLevel) -> BookRowView {
    BookRowView {
        price: format!("{:.2}", level.price),
        size: level.size.to_string(),
        value: format!("{:.0}K", level.value / 1000.0),
    }
}

pub fn order_book(book: &OrderBookSnapshot) -> BookView {
    BookView {
        bids: book.bids.iter().map(book_row).collect(),
        asks: book.asks.iter().map(book_row).collect(),
        spread: book
            .best_bid()
            .zip(book.best_ask())
            .map(|(bid, ask)| format!("{:.2}", ask - bid)),
    }
}

pub fn chart(chart: &ChartSnapshot) -> Vec<BarView> {
    chart
        .bars
        .iter()
        .map(|bar| BarView {
            left_px: bar.x,
            height_px: bar.height.round() as u32,
            width_px: crate::market_data::chart::BAR_WIDTH,
            color: match bar.direction {
                Direction::Up => GREEN,
                Direction::Down => RED,
            },
        })
        .collect()
}

/// `[HH:MM:SS]` stamp in local time.
pub fn console_line(entry: &ConsoleEntry) -> ConsoleLineView {
    ConsoleLineView {
        time: entry.at.format("[%H:%M:%S]").to_string(),
        category: entry.category.to_string(),
        text: entry.text.clone(),
    }
}

/// Exactly the link whose href is `#active` is marked active.
pub fn nav_links(sections: &[String], active: Option<&str>) -> Vec<NavLinkView> {
    sections
        .iter()
        .map(|s| NavLinkView {
            href: format!("#{s}"),
            active: active == Some(s.as_str()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::chart::CandleBar;
    use crate::types::Category;
    use chrono::{Local, TimeZone};

    #[test]
    fn price_line_formats_arrow_and_percent() {
        let q = PriceSnapshot {
            symbol: "MEBL".into(),
            price: 112_539.1,
            change: -0.25,
            change_percent: 1.01,
            direction: Direction::Down,
        };
        let v = price(&q);
        assert_eq!(v.price, "112539.10");
        assert_eq!(v.change, "▼ 0.25 (1.01%)");
        assert_eq!(v.change_class, "price-change negative");
    }

    #[test]
    fn book_value_in_thousands() {
        let book = OrderBookSnapshot {
            bids: vec![BookLevel {
                price: 18.61,
                size: 1030,
                value: 18.61 * 1030.0,
            }],
            asks: vec![],
        };
        let v = order_book(&book);
        assert_eq!(v.bids[0].price, "18.61");
        assert_eq!(v.bids[0].size, "1030");
        assert_eq!(v.bids[0].value, "19K");
        assert!(v.asks.is_empty());
        assert!(v.spread.is_none());
    }

    #[test]
    fn console_stamp_is_hh_mm_ss() {
        let entry = ConsoleEntry {
            at: Local.with_ymd_and_hms(2024, 1, 2, 9, 5, 7).unwrap(),
            category: Category::System,
            text: "hello".into(),
        };
        let v = console_line(&entry);
        assert_eq!(v.time, "[09:05:07]");
        assert_eq!(v.category, "SYSTEM");
    }

    #[test]
    fn only_matching_nav_link_is_active() {
        let sections = vec!["market".to_string(), "orders".to_string()];
        let links = nav_links(&sections, Some("orders"));
        assert_eq!(links[0].href, "#market");
        assert!(!links[0].active);
        assert!(links[1].active);
        assert!(nav_links(&sections, None).iter().all(|l| !l.active));
    }

    #[test]
    fn status_and_latency_text() {
        assert_eq!(status(ConnectionStatus::Connected).text, "WEBSOCKET CONNECTED");
        assert_eq!(status(ConnectionStatus::Disconnected).led_class, "ws-led");
        assert_eq!(latency(12), "12ms");
    }

    #[test]
    fn bars_keep_slot_and_colour() {
        let c = ChartSnapshot {
            bars: vec![CandleBar {
                index: 2,
                height: 99.6,
                direction: Direction::Up,
                x: 30,
            }],
        };
        let bars = chart(&c);
        assert_eq!(bars[0].left_px, 30);
        assert_eq!(bars[0].height_px, 100);
        assert_eq!(bars[0].width_px, 8);
        assert_eq!(bars[0].color, GREEN);
    }
}
