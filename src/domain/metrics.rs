//! Performance metrics per symbol and across the batch.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::collections::HashMap;

use super::backtest::{BacktestResult, FailedSymbol};
use super::portfolio::EquityPoint;
use super::position::RoundTrip;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolMetrics {
    pub symbol: String,
    pub return_pct: Decimal,
    pub num_trades: usize,
    pub round_trips: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub net_pnl: Decimal,
    pub total_costs: Decimal,
    pub max_drawdown: f64,
    pub avg_holding_days: f64,
    pub unrealized: bool,
}

impl SymbolMetrics {
    pub fn compute(result: &BacktestResult) -> Self {
        let wins = result.round_trips.iter().filter(|t| t.is_win()).count();
        let total_days: i64 = result.round_trips.iter().map(RoundTrip::holding_days).sum();
        let avg_holding_days = if result.round_trips.is_empty() {
            0.0
        } else {
            total_days as f64 / result.round_trips.len() as f64
        };

        SymbolMetrics {
            symbol: result.symbol.clone(),
            return_pct: result.final_return_pct,
            num_trades: result.num_trades,
            round_trips: result.round_trips.len(),
            wins,
            win_rate: win_rate(&result.round_trips),
            net_pnl: result.final_value - result.initial_capital,
            total_costs: result.total_costs,
            max_drawdown: compute_drawdown(&result.equity_curve),
            avg_holding_days,
            unrealized: result.is_unrealized(),
        }
    }
}

/// Fraction of closed round trips with positive net proceeds; 0 with none.
pub fn win_rate(round_trips: &[RoundTrip]) -> f64 {
    if round_trips.is_empty() {
        return 0.0;
    }
    let wins = round_trips.iter().filter(|t| t.is_win()).count();
    wins as f64 / round_trips.len() as f64
}

/// Largest peak-to-trough fall of the equity curve, as a fraction of peak.
pub fn compute_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak: Option<Decimal> = None;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        match peak {
            Some(p) if point.value <= p => {
                if p > Decimal::ZERO {
                    let dd = ((p - point.value) / p).to_f64().unwrap_or(0.0);
                    max_dd = max_dd.max(dd);
                }
            }
            _ => peak = Some(point.value),
        }
    }

    max_dd
}

/// Cross-symbol reduction of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub symbols_analyzed: usize,
    /// Arithmetic mean of per-symbol `final_return_pct`.
    pub avg_return: Decimal,
    pub total_trades: usize,
    pub win_rate: f64,
    /// Mean classifier accuracy in percent, when any was supplied.
    pub avg_ml_accuracy: Option<f64>,
    pub best_symbol: Option<String>,
    pub worst_symbol: Option<String>,
    pub failed_symbols: Vec<FailedSymbol>,
    pub timestamp: NaiveDateTime,
}

impl PortfolioSummary {
    /// `ml_accuracy` maps symbol to accuracy in [0, 1]. Ties on return are
    /// broken by ascending symbol for both best and worst.
    pub fn compute(
        results: &[BacktestResult],
        failures: &[FailedSymbol],
        ml_accuracy: &HashMap<String, f64>,
        timestamp: NaiveDateTime,
    ) -> Self {
        let avg_return = if results.is_empty() {
            Decimal::ZERO
        } else {
            let total: Decimal = results.iter().map(|r| r.final_return_pct).sum();
            total / Decimal::from(results.len())
        };

        let total_trades: usize = results.iter().map(|r| r.num_trades).sum();

        let all_trips: Vec<RoundTrip> = results
            .iter()
            .flat_map(|r| r.round_trips.iter().cloned())
            .collect();

        let accuracies: Vec<f64> = results
            .iter()
            .filter_map(|r| ml_accuracy.get(&r.symbol).copied())
            .collect();
        let avg_ml_accuracy = if accuracies.is_empty() {
            None
        } else {
            Some(accuracies.iter().sum::<f64>() / accuracies.len() as f64 * 100.0)
        };

        let best_symbol = results
            .iter()
            .max_by(|a, b| {
                a.final_return_pct
                    .cmp(&b.final_return_pct)
                    .then_with(|| b.symbol.cmp(&a.symbol))
            })
            .map(|r| r.symbol.clone());

        let worst_symbol = results
            .iter()
            .min_by(|a, b| {
                a.final_return_pct
                    .cmp(&b.final_return_pct)
                    .then_with(|| a.symbol.cmp(&b.symbol))
            })
            .map(|r| r.symbol.clone());

        PortfolioSummary {
            symbols_analyzed: results.len(),
            avg_return,
            total_trades,
            win_rate: win_rate(&all_trips),
            avg_ml_accuracy,
            best_symbol,
            worst_symbol,
            failed_symbols: failures.to_vec(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn timestamp() -> NaiveDateTime {
        date(31).and_hms_opt(18, 0, 0).unwrap()
    }

    fn trip(net: Decimal, days: i64) -> RoundTrip {
        RoundTrip {
            shares: 1,
            entry_date: date(1),
            exit_date: date(1) + chrono::Duration::days(days),
            entry_price: dec!(100),
            exit_price: dec!(100) + net,
            entry_outlay: dec!(100),
            exit_proceeds: dec!(100) + net,
        }
    }

    fn result(symbol: &str, return_pct: Decimal, trips: Vec<RoundTrip>) -> BacktestResult {
        BacktestResult {
            symbol: symbol.to_string(),
            trades: Vec::new(),
            num_trades: trips.len() * 2,
            round_trips: trips,
            equity_curve: Vec::new(),
            initial_capital: dec!(100000),
            final_cash: dec!(100000) + return_pct * dec!(1000),
            final_value: dec!(100000) + return_pct * dec!(1000),
            final_return_pct: return_pct,
            total_costs: Decimal::ZERO,
            open_position: None,
            rows_processed: 0,
            degenerate_rows: 0,
        }
    }

    fn curve(values: &[i64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| EquityPoint {
                date: date(1) + chrono::Duration::days(i as i64),
                cash: Decimal::from(v),
                shares: 0,
                value: Decimal::from(v),
            })
            .collect()
    }

    #[test]
    fn win_rate_counts_positive_net() {
        let trips = vec![
            trip(dec!(5), 3),
            trip(dec!(-2), 3),
            trip(Decimal::ZERO, 3),
            trip(dec!(1), 3),
        ];
        assert!((win_rate(&trips) - 0.5).abs() < f64::EPSILON);
        assert!((win_rate(&[]) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn drawdown_from_peak() {
        let dd = compute_drawdown(&curve(&[100, 110, 90, 95, 80, 100]));
        assert!((dd - 30.0 / 110.0).abs() < 1e-9);
    }

    #[test]
    fn drawdown_monotonic_curve_is_zero() {
        assert!((compute_drawdown(&curve(&[100, 101, 102])) - 0.0).abs() < f64::EPSILON);
        assert!((compute_drawdown(&[]) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn symbol_metrics() {
        let r = result("TCS.NS", dec!(1.5), vec![trip(dec!(5), 4), trip(dec!(-1), 10)]);
        let m = SymbolMetrics::compute(&r);
        assert_eq!(m.symbol, "TCS.NS");
        assert_eq!(m.return_pct, dec!(1.5));
        assert_eq!(m.num_trades, 4);
        assert_eq!(m.round_trips, 2);
        assert_eq!(m.wins, 1);
        assert!((m.win_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(m.net_pnl, dec!(1500));
        assert!((m.avg_holding_days - 7.0).abs() < f64::EPSILON);
        assert!(!m.unrealized);
    }

    #[test]
    fn summary_averages_and_extremes() {
        let results = vec![
            result("INFY.NS", dec!(-0.8), vec![trip(dec!(-3), 5)]),
            result("RELIANCE.NS", dec!(2.4), vec![trip(dec!(4), 5)]),
            result("TCS.NS", dec!(0.7), vec![]),
        ];
        let summary = PortfolioSummary::compute(&results, &[], &HashMap::new(), timestamp());

        assert_eq!(summary.symbols_analyzed, 3);
        assert_eq!(summary.avg_return, dec!(2.3) / Decimal::from(3));
        assert_eq!(summary.total_trades, 4);
        assert!((summary.win_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(summary.best_symbol.as_deref(), Some("RELIANCE.NS"));
        assert_eq!(summary.worst_symbol.as_deref(), Some("INFY.NS"));
        assert_eq!(summary.avg_ml_accuracy, None);
        assert_eq!(summary.timestamp, timestamp());
    }

    #[test]
    fn summary_ties_resolve_to_smaller_symbol() {
        let results = vec![
            result("TCS.NS", dec!(1.0), vec![]),
            result("INFY.NS", dec!(1.0), vec![]),
        ];
        let summary = PortfolioSummary::compute(&results, &[], &HashMap::new(), timestamp());
        assert_eq!(summary.best_symbol.as_deref(), Some("INFY.NS"));
        assert_eq!(summary.worst_symbol.as_deref(), Some("INFY.NS"));

        let reversed: Vec<_> = results.into_iter().rev().collect();
        let summary = PortfolioSummary::compute(&reversed, &[], &HashMap::new(), timestamp());
        assert_eq!(summary.best_symbol.as_deref(), Some("INFY.NS"));
    }

    #[test]
    fn summary_ml_accuracy_in_percent() {
        let results = vec![
            result("INFY.NS", dec!(0), vec![]),
            result("TCS.NS", dec!(0), vec![]),
        ];
        let mut ml = HashMap::new();
        ml.insert("INFY.NS".to_string(), 0.55);
        ml.insert("TCS.NS".to_string(), 0.65);
        ml.insert("WIPRO.NS".to_string(), 0.10);
        let summary = PortfolioSummary::compute(&results, &[], &ml, timestamp());
        assert!((summary.avg_ml_accuracy.unwrap() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn summary_empty_batch() {
        let failures = vec![FailedSymbol {
            symbol: "BAD.NS".into(),
            reason: "missing close column".into(),
        }];
        let summary = PortfolioSummary::compute(&[], &failures, &HashMap::new(), timestamp());
        assert_eq!(summary.symbols_analyzed, 0);
        assert_eq!(summary.avg_return, Decimal::ZERO);
        assert_eq!(summary.best_symbol, None);
        assert_eq!(summary.worst_symbol, None);
        assert_eq!(summary.failed_symbols, failures);
    }
}
