//! Synthetic indicator source.
//!
//! Generates a reproducible weekday price path per symbol so a batch can run
//! without market data on disk. The generator is seeded from the symbol name
//! alone: the same symbol always yields the same rows.

use crate::domain::error::TradingError;
use crate::domain::indicator::{IndicatorParams, apply_indicators};
use crate::domain::market_row::MarketRow;
use crate::ports::indicator_port::IndicatorSource;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

pub struct SyntheticSource {
    days: usize,
    start: NaiveDate,
    params: IndicatorParams,
}

impl SyntheticSource {
    pub fn new(days: usize, start: NaiveDate, params: IndicatorParams) -> Self {
        Self {
            days,
            start,
            params,
        }
    }

    /// FNV-1a over the symbol bytes.
    fn seed(symbol: &str) -> u64 {
        symbol.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
            (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        })
    }

    fn trading_days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start
            .iter_days()
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .take(self.days)
    }
}

/// Round to paise, never below one.
fn to_price(value: f64) -> Decimal {
    let cents = (value * 100.0).round().max(1.0) as i64;
    Decimal::new(cents, 2)
}

impl IndicatorSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn load(&self, symbol: &str) -> Result<Vec<MarketRow>, TradingError> {
        let mut rng = StdRng::seed_from_u64(Self::seed(symbol));

        let base_price = rng.gen_range(200.0..3000.0);
        let volatility = rng.gen_range(0.01..0.025);
        let drift = rng.gen_range(-0.0005..0.0008);

        let mut price: f64 = base_price;
        let rows = self
            .trading_days()
            .map(|date| {
                let ret = rng.gen_range(-volatility..volatility) + drift;
                let open = price;
                price *= 1.0 + ret;
                let close = price;

                let high = open.max(close) * (1.0 + rng.gen_range(0.0..volatility * 0.5));
                let low = open.min(close) * (1.0 - rng.gen_range(0.0..volatility * 0.5));
                let volume = (1_000_000.0 * rng.gen_range(0.5..2.0)) as u64;

                MarketRow::new(
                    date,
                    to_price(open),
                    to_price(high),
                    to_price(low),
                    to_price(close),
                    volume,
                )
            })
            .collect();

        Ok(apply_indicators(rows, &self.params))
    }
}
