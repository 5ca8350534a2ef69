//! Property tests for the simulator over arbitrary indicator series.

mod common;

use algotrader::domain::backtest::{BacktestConfig, run_symbol};
use algotrader::domain::market_row::MarketRow;
use algotrader::domain::position::RoundTrip;
use algotrader::domain::trade::{TradeAction, is_alternating};
use common::*;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn row_strategy() -> impl Strategy<Value = (i64, Option<f64>, Option<f64>, Option<f64>)> {
    (
        1i64..500_000,
        proptest::option::of(0.0f64..=100.0),
        proptest::option::of(50.0f64..150.0),
        proptest::option::of(50.0f64..150.0),
    )
}

fn series_strategy() -> impl Strategy<Value = Vec<MarketRow>> {
    proptest::collection::vec((row_strategy(), 1i64..5), 0..120).prop_map(|entries| {
        let mut day = date(2024, 1, 1);
        entries
            .into_iter()
            .map(|((cents, rsi, fast, slow), step)| {
                day += chrono::Duration::days(step);
                make_row(day, Decimal::new(cents, 2), rsi, fast, slow)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn entries_respect_allocation_cap(rows in series_strategy()) {
        let config = BacktestConfig::default();
        let result = run_symbol("PROP.NS", &rows, &config).unwrap();
        let cap = config.initial_capital * config.execution.max_allocation;
        for trade in result.trades.iter().filter(|t| t.action == TradeAction::Buy) {
            prop_assert!(trade.trade_value <= cap);
            prop_assert!(trade.shares > 0);
        }
    }

    #[test]
    fn ledger_alternates(rows in series_strategy()) {
        let result = run_symbol("PROP.NS", &rows, &BacktestConfig::default()).unwrap();
        prop_assert!(is_alternating(&result.trades));
        prop_assert_eq!(result.num_trades, result.trades.len());
        prop_assert_eq!(result.is_unrealized(), result.trades.len() % 2 == 1);
    }

    #[test]
    fn cash_is_conserved(rows in series_strategy()) {
        let config = BacktestConfig::default();
        let result = run_symbol("PROP.NS", &rows, &config).unwrap();
        let realized: Decimal = result.round_trips.iter().map(RoundTrip::gross_gain).sum();
        let cost_basis = result
            .open_position
            .as_ref()
            .map(|p| Decimal::from(p.shares) * p.entry_price)
            .unwrap_or(Decimal::ZERO);
        prop_assert_eq!(
            result.final_cash + cost_basis,
            config.initial_capital - result.total_costs + realized
        );
        prop_assert!(result.final_cash >= Decimal::ZERO);
    }

    #[test]
    fn undefined_rsi_never_buys(
        closes in proptest::collection::vec(1i64..500_000, 0..80),
    ) {
        let rows: Vec<MarketRow> = closes
            .iter()
            .enumerate()
            .map(|(i, &cents)| {
                make_row(
                    date(2024, 1, 1) + chrono::Duration::days(i as i64),
                    Decimal::new(cents, 2),
                    None,
                    Some(110.0),
                    Some(100.0),
                )
            })
            .collect();
        let result = run_symbol("WARM.NS", &rows, &BacktestConfig::default()).unwrap();
        prop_assert_eq!(result.num_trades, 0);
        prop_assert_eq!(result.final_return_pct, Decimal::ZERO);
    }

    #[test]
    fn runs_are_deterministic(rows in series_strategy()) {
        let config = BacktestConfig::default();
        let a = run_symbol("PROP.NS", &rows, &config).unwrap();
        let b = run_symbol("PROP.NS", &rows, &config).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn holds_never_exceed_max_days(rows in series_strategy()) {
        let config = BacktestConfig::default();
        let result = run_symbol("PROP.NS", &rows, &config).unwrap();
        for trip in &result.round_trips {
            // the exit fires on the first row at or past the limit
            let earliest_exit = rows
                .iter()
                .find(|r| (r.date - trip.entry_date).num_days() >= config.rules.max_hold_days)
                .map(|r| r.date);
            if let Some(limit_row) = earliest_exit {
                prop_assert!(trip.exit_date <= limit_row);
            }
        }
    }
}
