//! Trade ledger records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

/// One executed action. Ledgers are append-only and chronological.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub action: TradeAction,
    pub shares: u64,
    pub price: Decimal,
    /// `shares * price`, before costs.
    pub trade_value: Decimal,
    pub cost: Decimal,
    /// Cash plus position marked at `price`, after the trade settled.
    pub portfolio_value_after: Decimal,
}

impl TradeRecord {
    /// Cash that left (Buy, negative) or entered (Sell, positive) the account.
    pub fn cash_flow(&self) -> Decimal {
        match self.action {
            TradeAction::Buy => -(self.trade_value + self.cost),
            TradeAction::Sell => self.trade_value - self.cost,
        }
    }
}

/// True when the ledger starts with a Buy and strictly alternates.
pub fn is_alternating(trades: &[TradeRecord]) -> bool {
    trades.iter().enumerate().all(|(i, t)| {
        let expected = if i % 2 == 0 {
            TradeAction::Buy
        } else {
            TradeAction::Sell
        };
        t.action == expected
    })
}
