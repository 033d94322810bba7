// =============================================================================
// Runtime Configuration — Feed cadences, synthetic bands and server settings
// =============================================================================
//
// Every tunable of the simulated feed lives here. Persistence uses an atomic
// tmp + rename pattern. All fields carry `#[serde(default)]` so that adding
// new fields never breaks loading an older config file.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_symbol() -> String {
    "MEBL".to_string()
}

fn default_market_symbols() -> Vec<String> {
    vec!["MEBL".to_string(), "PSO".to_string(), "HUBC".to_string()]
}

fn default_account_id() -> String {
    "A12345678".to_string()
}

fn default_sections() -> Vec<String> {
    ["dashboard", "market", "orders", "websocket", "api"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_time_unit_ms() -> u64 {
    1000
}

fn default_ticker_units() -> u64 {
    3
}

fn default_price_units() -> u64 {
    2
}

fn default_latency_units() -> u64 {
    1
}

fn default_console_capacity() -> usize {
    20
}

fn default_price_min() -> f64 {
    112_500.0
}

fn default_price_max() -> f64 {
    112_600.0
}

fn default_book_base() -> f64 {
    18.61
}

fn default_book_tick() -> f64 {
    0.01
}

// =============================================================================
// FeedParams
// =============================================================================

/// Bands and shapes used by the synthetic snapshot generators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedParams {
    /// Lower bound of the synthetic last-price band.
    #[serde(default = "default_price_min")]
    pub price_min: f64,

    /// Upper bound of the synthetic last-price band.
    #[serde(default = "default_price_max")]
    pub price_max: f64,

    /// Reference price the order book ladders around.
    #[serde(default = "default_book_base")]
    pub book_base: f64,

    /// Price step between book levels.
    #[serde(default = "default_book_tick")]
    pub book_tick: f64,
}

impl Default for FeedParams {
    fn default() -> Self {
        Self {
            price_min: default_price_min(),
            price_max: default_price_max(),
            book_base: default_book_base(),
            book_tick: default_book_tick(),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the dashboard service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Address the HTTP/WebSocket API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Symbol quoted by the price, trade and order panels.
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Symbols announced by the market subscription.
    #[serde(default = "default_market_symbols")]
    pub market_symbols: Vec<String>,

    /// Account announced by the order-update subscription.
    #[serde(default = "default_account_id")]
    pub account_id: String,

    /// Navigable dashboard sections.
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,

    // --- Cadences ------------------------------------------------------------

    /// Length of one cadence time-unit in milliseconds.
    #[serde(default = "default_time_unit_ms")]
    pub time_unit_ms: u64,

    /// Chart / order book / trade line cadence, in time-units.
    #[serde(default = "default_ticker_units")]
    pub ticker_units: u64,

    /// Price quote cadence, in time-units.
    #[serde(default = "default_price_units")]
    pub price_units: u64,

    /// Latency display cadence, in time-units.
    #[serde(default = "default_latency_units")]
    pub latency_units: u64,

    /// Maximum number of console lines retained.
    #[serde(default = "default_console_capacity")]
    pub console_capacity: usize,

    #[serde(default)]
    pub feed: FeedParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            symbol: default_symbol(),
            market_symbols: default_market_symbols(),
            account_id: default_account_id(),
            sections: default_sections(),
            time_unit_ms: default_time_unit_ms(),
            ticker_units: default_ticker_units(),
            price_units: default_price_units(),
            latency_units: default_latency_units(),
            console_capacity: default_console_capacity(),
            feed: FeedParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbol = %config.symbol,
            time_unit_ms = config.time_unit_ms,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Apply `TICKERDECK_*` environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("TICKERDECK_BIND_ADDR") {
            if !addr.trim().is_empty() {
                self.bind_addr = addr.trim().to_string();
            }
        }
        if let Ok(symbol) = std::env::var("TICKERDECK_SYMBOL") {
            let symbol = symbol.trim().to_uppercase();
            if !symbol.is_empty() {
                self.symbol = symbol;
            }
        }
        if let Ok(unit) = std::env::var("TICKERDECK_TIME_UNIT_MS") {
            if let Ok(ms) = unit.trim().parse::<u64>() {
                if ms > 0 {
                    self.time_unit_ms = ms;
                }
            }
        }
    }

    fn units(&self, n: u64) -> Duration {
        // A zero period would make tokio's interval panic.
        Duration::from_millis(self.time_unit_ms.max(1) * n.max(1))
    }

    pub fn ticker_interval(&self) -> Duration {
        self.units(self.ticker_units)
    }

    pub fn price_interval(&self) -> Duration {
        self.units(self.price_units)
    }

    pub fn latency_interval(&self) -> Duration {
        self.units(self.latency_units)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.symbol, "MEBL");
        assert_eq!(cfg.market_symbols, vec!["MEBL", "PSO", "HUBC"]);
        assert_eq!(cfg.account_id, "A12345678");
        assert_eq!(cfg.console_capacity, 20);
        assert!((cfg.feed.price_min - 112_500.0).abs() < f64::EPSILON);
        assert!((cfg.feed.price_max - 112_600.0).abs() < f64::EPSILON);
        assert!(cfg.sections.iter().any(|s| s == "orders"));
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.time_unit_ms, 1000);
        assert_eq!(cfg.ticker_units, 3);
        assert_eq!(cfg.price_units, 2);
        assert_eq!(cfg.latency_units, 1);
        assert_eq!(cfg.bind_addr, "0.0.0.0:3001");
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "symbol": "PSO", "feed": { "book_tick": 0.05 } }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.symbol, "PSO");
        assert!((cfg.feed.book_tick - 0.05).abs() < f64::EPSILON);
        assert!((cfg.feed.book_base - 18.61).abs() < f64::EPSILON);
        assert_eq!(cfg.console_capacity, 20);
    }

    #[test]
    fn cadences_scale_with_time_unit() {
        let cfg = RuntimeConfig {
            time_unit_ms: 250,
            ..RuntimeConfig::default()
        };
        assert_eq!(cfg.ticker_interval(), Duration::from_millis(750));
        assert_eq!(cfg.price_interval(), Duration::from_millis(500));
        assert_eq!(cfg.latency_interval(), Duration::from_millis(250));
    }

    #[test]
    fn zero_cadence_is_clamped() {
        let cfg = RuntimeConfig {
            time_unit_ms: 0,
            price_units: 0,
            ..RuntimeConfig::default()
        };
        assert_eq!(cfg.price_interval(), Duration::from_millis(1));
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = std::env::temp_dir().join(format!("tickerdeck-cfg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let mut cfg = RuntimeConfig::default();
        cfg.symbol = "HUBC".into();
        cfg.console_capacity = 7;
        cfg.save(&path).unwrap();

        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded.symbol, "HUBC");
        assert_eq!(loaded.console_capacity, 7);
        assert!(!path.with_extension("json.tmp").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(RuntimeConfig::load("/nonexistent/tickerdeck.json").is_err());
    }
}
