// =============================================================================
// Sample Payloads — Canned JSON shown by the API docs panel
// =============================================================================

use serde::{Deserialize, Serialize};

/// Which canned payload to show or copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SampleKind {
    LastTrade,
    Quote,
    Depth,
}

impl SampleKind {
    pub const ALL: [SampleKind; 3] = [Self::LastTrade, Self::Quote, Self::Depth];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LastTrade => "last-trade",
            Self::Quote => "quote",
            Self::Depth => "depth",
        }
    }

    pub fn payload(self) -> &'static str {
        match self {
            Self::LastTrade => LAST_TRADE_JSON,
            Self::Quote => QUOTE_JSON,
            Self::Depth => DEPTH_JSON,
        }
    }
}

impl std::fmt::Display for SampleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SampleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown sample kind: '{s}'"))
    }
}

const LAST_TRADE_JSON: &str = r#"{
  "symbol": "MEBL",
  "price": 112539.17,
  "change": 0.25,
  "change_percent": 1.01,
  "volume": 4123123,
  "time": "09:59 AM"
}"#;

const QUOTE_JSON: &str = r#"{
  "symbol": "MEBL",
  "bid": {
    "price": 18.61,
    "size": 1030
  },
  "ask": {
    "price": 18.61,
    "size": 175
  },
  "spread": 0.00
}"#;

const DEPTH_JSON: &str = r#"{
  "symbol": "MEBL",
  "bids": [
    {"price": 18.61, "size": 1030},
    {"price": 18.60, "size": 1500}
  ],
  "asks": [
    {"price": 18.61, "size": 175},
    {"price": 18.62, "size": 200}
  ]
}"#;
