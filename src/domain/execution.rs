//! Trade execution: entry sizing, transaction costs and the Flat/Long
//! transitions applied to a [`Portfolio`].

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;

use super::error::TradingError;
use super::market_row::MarketRow;
use super::portfolio::Portfolio;
use super::position::{Position, RoundTrip};
use super::trade::{TradeAction, TradeRecord};

/// Costs and sizing limits applied to every fill.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    /// Fraction of trade value charged on both Buy and Sell.
    pub cost_rate: Decimal,
    /// Hard cap on the share of starting capital put into one entry.
    pub max_allocation: Decimal,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            cost_rate: dec!(0.001),
            max_allocation: dec!(0.30),
        }
    }
}

pub fn calculate_cost(trade_value: Decimal, config: &ExecutionConfig) -> Decimal {
    trade_value * config.cost_rate
}

/// Whole shares to buy at `price`.
///
/// `allocated = min(available_cash, max_allocation * total_capital)` and
/// `shares = floor(allocated / price)`. When the outlay including cost would
/// exceed available cash the count is reduced to what cash covers.
pub fn size_entry(
    available_cash: Decimal,
    total_capital: Decimal,
    price: Decimal,
    config: &ExecutionConfig,
) -> u64 {
    if price <= Decimal::ZERO || available_cash <= Decimal::ZERO {
        return 0;
    }

    // overflow anywhere means no position can be sized
    let Some(cap) = total_capital.checked_mul(config.max_allocation) else {
        return 0;
    };
    let allocated = available_cash.min(cap);
    let Some(mut shares) = allocated.checked_div(price).map(|s| s.floor()) else {
        return 0;
    };

    let Some(unit_outlay) = price.checked_mul(Decimal::ONE + config.cost_rate) else {
        return 0;
    };
    if shares
        .checked_mul(unit_outlay)
        .is_none_or(|outlay| outlay > available_cash)
    {
        shares = available_cash
            .checked_div(unit_outlay)
            .map(|s| s.floor())
            .unwrap_or(Decimal::ZERO);
    }

    shares.to_u64().unwrap_or(0)
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered(TradeRecord),
    InsufficientCapital,
}

/// Open a long position at the row's close.
///
/// Fails with [`TradingError::InvalidTransition`] when already long.
pub fn enter_long(
    portfolio: &mut Portfolio,
    row: &MarketRow,
    config: &ExecutionConfig,
) -> Result<EntryResult, TradingError> {
    if portfolio.position.is_long() {
        return Err(invalid_transition(portfolio, row, TradeAction::Buy));
    }

    let shares = size_entry(portfolio.cash, portfolio.initial_capital, row.close, config);
    if shares == 0 {
        return Ok(EntryResult::InsufficientCapital);
    }

    let trade_value = Decimal::from(shares)
        .checked_mul(row.close)
        .ok_or_else(|| portfolio.overflow(row.date, row.close))?;
    let cost = calculate_cost(trade_value, config);

    portfolio.cash -= trade_value + cost;
    portfolio.total_costs += cost;
    portfolio.position = Position::Long {
        entry_price: row.close,
        entry_date: row.date,
        shares,
    };

    let record = TradeRecord {
        date: row.date,
        symbol: portfolio.symbol.clone(),
        action: TradeAction::Buy,
        shares,
        price: row.close,
        trade_value,
        cost,
        portfolio_value_after: portfolio
            .total_value(row.close)
            .ok_or_else(|| portfolio.overflow(row.date, row.close))?,
    };
    portfolio.record_trade(record.clone());

    Ok(EntryResult::Entered(record))
}

/// Liquidate the whole position at the row's close.
///
/// Fails with [`TradingError::InvalidTransition`] when flat.
pub fn exit_long(
    portfolio: &mut Portfolio,
    row: &MarketRow,
    config: &ExecutionConfig,
) -> Result<TradeRecord, TradingError> {
    let Position::Long {
        entry_price,
        entry_date,
        shares,
    } = portfolio.position
    else {
        return Err(invalid_transition(portfolio, row, TradeAction::Sell));
    };

    let trade_value = Decimal::from(shares)
        .checked_mul(row.close)
        .ok_or_else(|| portfolio.overflow(row.date, row.close))?;
    let cost = calculate_cost(trade_value, config);
    let cash_after = portfolio
        .cash
        .checked_add(trade_value - cost)
        .ok_or_else(|| portfolio.overflow(row.date, row.close))?;

    // The ledger alternates, so the last record is this position's Buy.
    let entry_outlay = portfolio
        .trades
        .last()
        .filter(|t| t.action == TradeAction::Buy)
        .map(|t| t.trade_value + t.cost)
        .unwrap_or_else(|| {
            let value = Decimal::from(shares) * entry_price;
            value + calculate_cost(value, config)
        });

    portfolio.cash = cash_after;
    portfolio.total_costs += cost;
    portfolio.position = Position::Flat;

    portfolio.record_round_trip(RoundTrip {
        shares,
        entry_date,
        exit_date: row.date,
        entry_price,
        exit_price: row.close,
        entry_outlay,
        exit_proceeds: trade_value - cost,
    });

    let record = TradeRecord {
        date: row.date,
        symbol: portfolio.symbol.clone(),
        action: TradeAction::Sell,
        shares,
        price: row.close,
        trade_value,
        cost,
        portfolio_value_after: portfolio.cash,
    };
    portfolio.record_trade(record.clone());

    Ok(record)
}

fn invalid_transition(portfolio: &Portfolio, row: &MarketRow, action: TradeAction) -> TradingError {
    TradingError::InvalidTransition {
        symbol: portfolio.symbol.clone(),
        date: row.date,
        action,
        state: portfolio.position.state_name(),
    }
}
