// =============================================================================
// Trade Prints & Link Latency — Cosmetic feed activity
// =============================================================================

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A fake fill announced in the console as a `TRADE` line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradePrint {
    pub symbol: String,
    pub price: f64,
    pub shares: u64,
}

impl std::fmt::Display for TradePrint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:.2} ({} shares)", self.symbol, self.price, self.shares)
    }
}

const MAX_SHARES: f64 = 5000.0;

/// Trade price is uniform in `[min, max]`, share count in `[0, 5000)`.
pub fn generate_trade<R: Rng>(rng: &mut R, symbol: &str, min: f64, max: f64) -> TradePrint {
    let span = (max - min).max(0.0);
    TradePrint {
        symbol: symbol.to_string(),
        price: min + rng.gen::<f64>() * span,
        shares: (rng.gen::<f64>() * MAX_SHARES).floor() as u64,
    }
}

/// Displayed round-trip latency in milliseconds, `8..=22`.
pub fn generate_latency_ms<R: Rng>(rng: &mut R) -> u32 {
    8 + rng.gen_range(0..15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn trade_line_format() {
        let t = TradePrint {
            symbol: "MEBL".into(),
            price: 112_539.171,
            shares: 42,
        };
        assert_eq!(t.to_string(), "MEBL: 112539.17 (42 shares)");
    }

    #[test]
    fn trade_bounds() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..1_000 {
            let t = generate_trade(&mut rng, "MEBL", 112_500.0, 112_600.0);
            assert!(t.price >= 112_500.0 && t.price <= 112_600.0);
            assert!(t.shares < 5000);
        }
    }

    #[test]
    fn latency_band() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut seen_low = false;
        let mut seen_high = false;
        for _ in 0..5_000 {
            let ms = generate_latency_ms(&mut rng);
            assert!((8..=22).contains(&ms));
            seen_low |= ms == 8;
            seen_high |= ms == 22;
        }
        assert!(seen_low && seen_high);
    }
}
