// =============================================================================
// Candle Chart — Synthetic bar heights for the mini chart
// =============================================================================

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::Direction;

/// Horizontal distance between bar origins, in chart pixels.
pub const BAR_SPACING: u32 = 15;
/// Rendered width of a single bar.
pub const BAR_WIDTH: u32 = 8;
/// Bars in the dashboard's mini chart.
pub const CHART_BARS: usize = 30;

const MIN_HEIGHT: f64 = 30.0;
const HEIGHT_RANGE: f64 = 150.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleBar {
    pub index: usize,
    pub height: f64,
    pub direction: Direction,
    pub x: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartSnapshot {
    pub bars: Vec<CandleBar>,
}

/// Regenerate `bars` candles. Heights fall in `[30, 180)`; each bar is
/// green or red with equal probability.
pub fn generate_chart<R: Rng>(rng: &mut R, bars: usize) -> ChartSnapshot {
    let bars = (0..bars)
        .map(|index| CandleBar {
            index,
            height: MIN_HEIGHT + rng.gen::<f64>() * HEIGHT_RANGE,
            direction: if rng.gen_bool(0.5) {
                Direction::Up
            } else {
                Direction::Down
            },
            x: index as u32 * BAR_SPACING,
        })
        .collect();

    ChartSnapshot { bars }
}
