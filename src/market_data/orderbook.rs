// =============================================================================
// Order Book — Synthetic five-level depth ladder
// =============================================================================

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::price::round_cents;

/// Levels per side of the dashboard's depth ladder.
pub const BOOK_LEVELS: usize = 5;

/// One price level of the book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub size: u64,
    /// Notional value (`price * size`).
    pub value: f64,
}

/// Bids (best first, descending) and asks (best first, ascending).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBookSnapshot {
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }
}

/// Regenerate the whole book around `base`.
///
/// Bid level `i` (0-based) sits at `base - i*tick - U[0, 2*tick)` with
/// 500..2500 shares; ask level `i` (1-based) at `base + i*tick + U[0, 2*tick)`
/// with 400..1900 shares.
pub fn generate_order_book<R: Rng>(
    rng: &mut R,
    base: f64,
    tick: f64,
    levels: usize,
) -> OrderBookSnapshot {
    let tick = tick.max(0.0);

    let bids = (0..levels)
        .map(|i| {
            let price = round_cents(base - i as f64 * tick - rng.gen::<f64>() * 2.0 * tick);
            let size = (500.0 + rng.gen::<f64>() * 2000.0).floor() as u64;
            level(price, size)
        })
        .collect();

    let asks = (1..=levels)
        .map(|i| {
            let price = round_cents(base + i as f64 * tick + rng.gen::<f64>() * 2.0 * tick);
            let size = (400.0 + rng.gen::<f64>() * 1500.0).floor() as u64;
            level(price, size)
        })
        .collect();

    OrderBookSnapshot { bids, asks }
}

fn level(price: f64, size: u64) -> BookLevel {
    BookLevel {
        price,
        size,
        value: price * size as f64,
    }
}
