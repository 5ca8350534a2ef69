//! Indicator columns consumed by the signal rules.
//!
//! Every series is aligned one-to-one with the input closes. Warm-up
//! positions are `None`, never zero. A non-positive close is masked out, so
//! every window that touches it is undefined as well.

pub mod rsi;
pub mod sma;

use super::market_row::MarketRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub ma_fast: usize,
    pub ma_slow: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            rsi_period: 14,
            ma_fast: 20,
            ma_slow: 50,
        }
    }
}

impl IndicatorParams {
    /// Rows needed before every indicator can be defined.
    pub fn warmup(&self) -> usize {
        (self.rsi_period + 1).max(self.ma_fast).max(self.ma_slow)
    }
}

/// Fill `rsi`, `ma_fast` and `ma_slow` on every row from its closes.
pub fn apply_indicators(rows: Vec<MarketRow>, params: &IndicatorParams) -> Vec<MarketRow> {
    let closes: Vec<f64> = rows
        .iter()
        .map(|row| {
            if row.has_valid_price() {
                row.close_f64()
            } else {
                f64::NAN
            }
        })
        .collect();
    let rsi = rsi::calculate_rsi(&closes, params.rsi_period);
    let fast = sma::calculate_sma(&closes, params.ma_fast);
    let slow = sma::calculate_sma(&closes, params.ma_slow);

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| row.with_indicators(rsi[i], fast[i], slow[i]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn series(closes: impl IntoIterator<Item = i64>) -> Vec<MarketRow> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .into_iter()
            .enumerate()
            .map(|(i, close)| {
                let close = Decimal::from(close);
                MarketRow::new(
                    start + chrono::Duration::days(i as i64),
                    close,
                    close,
                    close,
                    close,
                    500,
                )
            })
            .collect()
    }

    fn rows(count: usize) -> Vec<MarketRow> {
        series((0..count).map(|i| 100 + (i % 7) as i64))
    }

    #[test]
    fn warmup_is_longest_window() {
        assert_eq!(IndicatorParams::default().warmup(), 50);
        let params = IndicatorParams {
            rsi_period: 30,
            ma_fast: 5,
            ma_slow: 10,
        };
        assert_eq!(params.warmup(), 31);
    }

    #[test]
    fn apply_indicators_aligns_columns() {
        let out = apply_indicators(rows(60), &IndicatorParams::default());
        assert_eq!(out.len(), 60);

        assert!(out[13].rsi.is_none());
        assert!(out[14].rsi.is_some());
        assert!(out[18].ma_fast.is_none());
        assert!(out[19].ma_fast.is_some());
        assert!(out[48].ma_slow.is_none());
        assert!(out[49].ma_slow.is_some());
    }

    #[test]
    fn short_series_has_no_slow_ma() {
        let out = apply_indicators(rows(30), &IndicatorParams::default());
        assert!(out.iter().all(|r| r.ma_slow.is_none()));
    }

    #[test]
    fn zero_tick_masks_windows_without_distorting() {
        let params = IndicatorParams::default();
        let clean = apply_indicators(series(100..180), &params);
        let mut closes: Vec<i64> = (100..180).collect();
        closes[60] = 0;
        let ticked = apply_indicators(series(closes), &params);

        // rows before the bad tick are untouched
        for i in 0..60 {
            assert_eq!(ticked[i].rsi, clean[i].rsi);
            assert_eq!(ticked[i].ma_fast, clean[i].ma_fast);
            assert_eq!(ticked[i].ma_slow, clean[i].ma_slow);
        }

        // every window that contains it is undefined
        for i in 60..=74 {
            assert_eq!(ticked[i].rsi, None, "rsi at {}", i);
        }
        for i in 60..=79 {
            assert_eq!(ticked[i].ma_fast, None, "ma_fast at {}", i);
            assert_eq!(ticked[i].ma_slow, None, "ma_slow at {}", i);
        }

        // and once it leaves the window the value matches the clean series
        assert_eq!(ticked[75].rsi, Some(100.0));
        assert_eq!(ticked[75].rsi, clean[75].rsi);
    }
}
