//! Daily market row: OHLCV plus the indicator columns aligned to it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

#[derive(Debug, Clone, PartialEq)]
pub struct MarketRow {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
    /// `None` during warm-up or when the source delivered NaN.
    pub rsi: Option<f64>,
    pub ma_fast: Option<f64>,
    pub ma_slow: Option<f64>,
}

impl MarketRow {
    /// A row with no indicator values yet.
    pub fn new(
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: u64,
    ) -> Self {
        MarketRow {
            date,
            open,
            high,
            low,
            close,
            volume,
            rsi: None,
            ma_fast: None,
            ma_slow: None,
        }
    }

    /// Attach indicator values. Non-finite values and RSI readings outside
    /// [0, 100] are stored as undefined.
    pub fn with_indicators(
        mut self,
        rsi: Option<f64>,
        ma_fast: Option<f64>,
        ma_slow: Option<f64>,
    ) -> Self {
        self.rsi = rsi.and_then(defined).filter(|v| (0.0..=100.0).contains(v));
        self.ma_fast = ma_fast.and_then(defined);
        self.ma_slow = ma_slow.and_then(defined);
        self
    }

    /// Zero or negative closes cannot be traded on.
    pub fn has_valid_price(&self) -> bool {
        self.close > Decimal::ZERO
    }

    pub fn close_f64(&self) -> f64 {
        self.close.to_f64().unwrap_or(f64::NAN)
    }
}

/// Map NaN and infinities to "undefined".
pub fn defined(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
