//! Indicator source port.
//!
//! Delivers one symbol's daily rows in chronological order with the RSI and
//! moving-average columns already aligned. Live files and synthetic fixtures
//! are two implementations of the same capability.

use crate::domain::error::TradingError;
use crate::domain::market_row::MarketRow;

pub trait IndicatorSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    fn load(&self, symbol: &str) -> Result<Vec<MarketRow>, TradingError>;
}
