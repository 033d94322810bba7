pub mod chart;
pub mod orderbook;
pub mod price;
pub mod trade_stream;

pub use chart::{generate_chart, ChartSnapshot, CHART_BARS};
pub use orderbook::{generate_order_book, BookLevel, OrderBookSnapshot, BOOK_LEVELS};
pub use price::{generate_price, PriceSnapshot};
pub use trade_stream::{generate_latency_ms, generate_trade, TradePrint};
