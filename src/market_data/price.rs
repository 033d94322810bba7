// =============================================================================
// Price Quote — Synthetic last price and daily change
// =============================================================================

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::Direction;

/// Last displayed quote. Regenerated wholesale on every price tick; no
/// history is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub symbol: String,
    pub price: f64,
    /// Signed absolute change, rounded to cents.
    pub change: f64,
    /// Percentage change, always non-negative.
    pub change_percent: f64,
    pub direction: Direction,
}

/// Draw a fresh quote with `price` uniformly inside `[min, max]`.
pub fn generate_price<R: Rng>(
    rng: &mut R,
    symbol: &str,
    min: f64,
    max: f64,
) -> PriceSnapshot {
    let span = (max - min).max(0.0);
    let price = round_cents(min + rng.gen::<f64>() * span).clamp(min, min + span);

    let change = round_cents(rng.gen::<f64>() * 2.0 - 1.0);
    let change_percent = round_cents(rng.gen::<f64>() * 2.0);

    // -0.00 still counts as an up move.
    let direction = if change >= 0.0 {
        Direction::Up
    } else {
        Direction::Down
    };

    PriceSnapshot {
        symbol: symbol.to_string(),
        price,
        change,
        change_percent,
        direction,
    }
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
