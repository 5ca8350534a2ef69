//! Backtest simulator.
//!
//! Each symbol is a deterministic fold over its rows: compute `days_held`,
//! ask the signal rules for an action, apply it through the execution layer,
//! verify cash conservation after every fill, and record daily equity.
//! Symbols share nothing mutable, so a batch runs them in parallel and merges
//! the outcomes in symbol order.

use chrono::NaiveDate;
use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::TradingError;
use super::execution::{self, EntryResult, ExecutionConfig};
use super::market_row::MarketRow;
use super::portfolio::{EquityPoint, Portfolio};
use super::position::{Position, RoundTrip};
use super::signal::{Signal, SignalRules};
use super::trade::{TradeAction, TradeRecord};
use crate::ports::indicator_port::IndicatorSource;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: Decimal,
    pub execution: ExecutionConfig,
    pub rules: SignalRules,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: dec!(100000),
            execution: ExecutionConfig::default(),
            rules: SignalRules::default(),
        }
    }
}

/// A position still open when the series ended. It is reported, not closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenPosition {
    pub entry_date: NaiveDate,
    pub entry_price: Decimal,
    pub shares: u64,
    pub mark_price: Decimal,
    pub unrealized_pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub symbol: String,
    pub trades: Vec<TradeRecord>,
    pub round_trips: Vec<RoundTrip>,
    pub equity_curve: Vec<EquityPoint>,
    pub initial_capital: Decimal,
    pub final_cash: Decimal,
    /// Cash plus any open position marked at the last valid close.
    pub final_value: Decimal,
    pub final_return_pct: Decimal,
    pub num_trades: usize,
    pub total_costs: Decimal,
    pub open_position: Option<OpenPosition>,
    pub rows_processed: usize,
    /// Rows whose close was zero or negative and were forced to Hold.
    pub degenerate_rows: usize,
}

impl BacktestResult {
    pub fn is_unrealized(&self) -> bool {
        self.open_position.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// Outcome of a multi-symbol run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResult {
    pub results: Vec<BacktestResult>,
    pub failures: Vec<FailedSymbol>,
}

/// Dates must be strictly increasing.
pub fn validate_series(symbol: &str, rows: &[MarketRow]) -> Result<(), TradingError> {
    for pair in rows.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(TradingError::InputData {
                symbol: symbol.to_string(),
                reason: format!(
                    "dates not strictly increasing: {} followed by {}",
                    pair[0].date, pair[1].date
                ),
            });
        }
    }
    Ok(())
}

/// Simulate one symbol over its full series.
pub fn run_symbol(
    symbol: &str,
    rows: &[MarketRow],
    config: &BacktestConfig,
) -> Result<BacktestResult, TradingError> {
    validate_series(symbol, rows)?;

    let mut portfolio = Portfolio::new(symbol, config.initial_capital);
    let mut last_close: Option<Decimal> = None;
    let mut degenerate_rows = 0usize;

    for row in rows {
        if !row.has_valid_price() {
            degenerate_rows += 1;
            warn!(symbol, date = %row.date, close = %row.close, "non-positive close, holding");
            continue;
        }
        last_close = Some(row.close);

        let days_held = portfolio.position.days_held(row.date);
        let signal = config.rules.evaluate(row, &portfolio.position, days_held);
        ensure_transition(&portfolio, row, signal)?;

        match signal {
            Signal::Buy => {
                match execution::enter_long(&mut portfolio, row, &config.execution)? {
                    EntryResult::Entered(trade) => {
                        debug!(symbol, date = %trade.date, shares = trade.shares, price = %trade.price, "buy");
                        portfolio.check_conservation(row.date)?;
                    }
                    EntryResult::InsufficientCapital => {
                        warn!(symbol, date = %row.date, cash = %portfolio.cash, "buy signal skipped, insufficient capital");
                    }
                }
            }
            Signal::Sell => {
                let trade = execution::exit_long(&mut portfolio, row, &config.execution)?;
                debug!(symbol, date = %trade.date, shares = trade.shares, price = %trade.price, days_held, "sell");
                portfolio.check_conservation(row.date)?;
            }
            Signal::Hold => {}
        }

        portfolio.record_equity(row.date, row.close)?;
    }

    let result = finish(portfolio, last_close, rows.len(), degenerate_rows)?;
    info!(
        symbol,
        trades = result.num_trades,
        return_pct = %result.final_return_pct.round_dp(2),
        unrealized = result.is_unrealized(),
        "backtest complete"
    );
    Ok(result)
}

/// The rules only emit Buy when flat and Sell when long; anything else is a
/// defect and stops the run before the tracker is touched.
fn ensure_transition(
    portfolio: &Portfolio,
    row: &MarketRow,
    signal: Signal,
) -> Result<(), TradingError> {
    let action = match (signal, &portfolio.position) {
        (Signal::Buy, Position::Long { .. }) => TradeAction::Buy,
        (Signal::Sell, Position::Flat) => TradeAction::Sell,
        _ => return Ok(()),
    };
    Err(TradingError::InvalidTransition {
        symbol: portfolio.symbol.clone(),
        date: row.date,
        action,
        state: portfolio.position.state_name(),
    })
}

fn finish(
    portfolio: Portfolio,
    last_close: Option<Decimal>,
    rows_processed: usize,
    degenerate_rows: usize,
) -> Result<BacktestResult, TradingError> {
    let open_position = match (portfolio.position, last_close) {
        (
            Position::Long {
                entry_price,
                entry_date,
                shares,
            },
            Some(mark_price),
        ) => Some(OpenPosition {
            entry_date,
            entry_price,
            shares,
            mark_price,
            unrealized_pnl: portfolio
                .position
                .unrealized_pnl(mark_price)
                .ok_or_else(|| portfolio.overflow(entry_date, mark_price))?,
        }),
        _ => None,
    };

    let final_value = match &open_position {
        Some(open) => portfolio
            .total_value(open.mark_price)
            .ok_or_else(|| portfolio.overflow(open.entry_date, open.mark_price))?,
        None => portfolio.cash,
    };
    let initial = portfolio.initial_capital;
    let final_return_pct = if initial > Decimal::ZERO {
        (final_value - initial) / initial * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    Ok(BacktestResult {
        num_trades: portfolio.trades.len(),
        symbol: portfolio.symbol,
        trades: portfolio.trades,
        round_trips: portfolio.round_trips,
        equity_curve: portfolio.equity_curve,
        initial_capital: initial,
        final_cash: portfolio.cash,
        final_value,
        final_return_pct,
        total_costs: portfolio.total_costs,
        open_position,
        rows_processed,
        degenerate_rows,
    })
}

/// Load and simulate every symbol in parallel.
///
/// Symbol-scoped failures (unreadable or malformed series) are collected into
/// [`BatchResult::failures`] and the remaining symbols still run. Any other
/// error aborts the batch.
pub fn run_batch(
    source: &dyn IndicatorSource,
    symbols: &[String],
    config: &BacktestConfig,
) -> Result<BatchResult, TradingError> {
    info!(source = source.name(), symbols = symbols.len(), "running batch");

    let outcomes: Vec<(String, Result<BacktestResult, TradingError>)> = symbols
        .par_iter()
        .map(|symbol| {
            let outcome = source
                .load(symbol)
                .and_then(|rows| run_symbol(symbol, &rows, config));
            (symbol.clone(), outcome)
        })
        .collect();

    let mut batch = BatchResult::default();
    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(result) => batch.results.push(result),
            Err(e) if e.is_symbol_scoped() => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                batch.failures.push(FailedSymbol {
                    symbol,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    batch.results.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    batch.failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    Ok(batch)
}
