#![allow(dead_code)]

use algotrader::domain::error::TradingError;
use algotrader::domain::market_row::MarketRow;
use algotrader::ports::indicator_port::IndicatorSource;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

pub enum MockFailure {
    Data(String),
    InputData(String),
    Conservation,
}

pub struct MockSource {
    pub data: HashMap<String, Vec<MarketRow>>,
    pub errors: HashMap<String, MockFailure>,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_rows(mut self, symbol: &str, rows: Vec<MarketRow>) -> Self {
        self.data.insert(symbol.to_string(), rows);
        self
    }

    pub fn with_error(mut self, symbol: &str, failure: MockFailure) -> Self {
        self.errors.insert(symbol.to_string(), failure);
        self
    }
}

impl IndicatorSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn load(&self, symbol: &str) -> Result<Vec<MarketRow>, TradingError> {
        match self.errors.get(symbol) {
            Some(MockFailure::Data(reason)) => Err(TradingError::Data {
                reason: reason.clone(),
            }),
            Some(MockFailure::InputData(reason)) => Err(TradingError::InputData {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            }),
            Some(MockFailure::Conservation) => Err(TradingError::ConservationViolated {
                symbol: symbol.to_string(),
                date: date(2024, 1, 1),
                expected: Decimal::ONE,
                actual: Decimal::ZERO,
            }),
            None => Ok(self.data.get(symbol).cloned().unwrap_or_default()),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A row whose open/high/low equal the close.
pub fn make_row(
    date: NaiveDate,
    close: Decimal,
    rsi: Option<f64>,
    ma_fast: Option<f64>,
    ma_slow: Option<f64>,
) -> MarketRow {
    MarketRow::new(date, close, close, close, close, 1000).with_indicators(rsi, ma_fast, ma_slow)
}

/// `count` consecutive calendar days at a constant close, neutral RSI and an
/// uptrend (ma_fast 110 > ma_slow 100). Tests overwrite individual rows.
pub fn neutral_rows(start: NaiveDate, count: usize, close: Decimal) -> Vec<MarketRow> {
    (0..count)
        .map(|i| {
            make_row(
                start + chrono::Duration::days(i as i64),
                close,
                Some(40.0),
                Some(110.0),
                Some(100.0),
            )
        })
        .collect()
}

/// Rows with every indicator undefined, as during warm-up.
pub fn warmup_rows(start: NaiveDate, closes: &[Decimal]) -> Vec<MarketRow> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            make_row(start + chrono::Duration::days(i as i64), close, None, None, None)
        })
        .collect()
}

pub fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
