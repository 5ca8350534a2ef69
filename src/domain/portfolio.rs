//! Single-symbol account: cash, position, ledger and equity curve.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::error::TradingError;
use super::position::{Position, RoundTrip};
use super::trade::TradeRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub cash: Decimal,
    pub shares: u64,
    pub value: Decimal,
}

/// Everything the simulator mutates while walking one symbol's series.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub symbol: String,
    pub initial_capital: Decimal,
    pub cash: Decimal,
    pub position: Position,
    pub trades: Vec<TradeRecord>,
    pub round_trips: Vec<RoundTrip>,
    pub equity_curve: Vec<EquityPoint>,
    pub total_costs: Decimal,
    pub realized_gains: Decimal,
}

impl Portfolio {
    pub fn new(symbol: &str, initial_capital: Decimal) -> Self {
        Portfolio {
            symbol: symbol.to_string(),
            initial_capital,
            cash: initial_capital,
            position: Position::Flat,
            trades: Vec::new(),
            round_trips: Vec::new(),
            equity_curve: Vec::new(),
            total_costs: Decimal::ZERO,
            realized_gains: Decimal::ZERO,
        }
    }

    /// Cash plus the position marked at `price`; `None` on overflow.
    pub fn total_value(&self, price: Decimal) -> Option<Decimal> {
        self.cash.checked_add(self.position.market_value(price)?)
    }

    pub fn record_trade(&mut self, trade: TradeRecord) {
        self.trades.push(trade);
    }

    pub fn record_round_trip(&mut self, trip: RoundTrip) {
        self.realized_gains += trip.gross_gain();
        self.round_trips.push(trip);
    }

    pub fn record_equity(&mut self, date: NaiveDate, price: Decimal) -> Result<(), TradingError> {
        let value = self
            .total_value(price)
            .ok_or_else(|| self.overflow(date, price))?;
        self.equity_curve.push(EquityPoint {
            date,
            cash: self.cash,
            shares: self.position.shares(),
            value,
        });
        Ok(())
    }

    /// A price too large to value exactly. The series is unusable, so only
    /// this symbol fails.
    pub fn overflow(&self, date: NaiveDate, price: Decimal) -> TradingError {
        TradingError::InputData {
            symbol: self.symbol.clone(),
            reason: format!("arithmetic overflow valuing close {} on {}", price, date),
        }
    }

    /// `cash + cost_basis(open) == initial - costs + realized gains`.
    pub fn check_conservation(&self, date: NaiveDate) -> Result<(), TradingError> {
        let expected = self.initial_capital - self.total_costs + self.realized_gains;
        let actual = self.cash + self.position.cost_basis();
        if expected != actual {
            return Err(TradingError::ConservationViolated {
                symbol: self.symbol.clone(),
                date,
                expected,
                actual,
            });
        }
        Ok(())
    }
}
