//! Per-symbol holding state and closed round trips.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Holding state for one symbol. `Long` always carries a positive share
/// count; `Flat` carries nothing, so the Flat/Long invariant is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Flat,
    Long {
        entry_price: Decimal,
        entry_date: NaiveDate,
        shares: u64,
    },
}

impl Position {
    pub fn is_long(&self) -> bool {
        matches!(self, Position::Long { .. })
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            Position::Flat => "flat",
            Position::Long { .. } => "long",
        }
    }

    pub fn shares(&self) -> u64 {
        match self {
            Position::Flat => 0,
            Position::Long { shares, .. } => *shares,
        }
    }

    /// Calendar days since entry; 0 when flat.
    pub fn days_held(&self, date: NaiveDate) -> i64 {
        match self {
            Position::Flat => 0,
            Position::Long { entry_date, .. } => (date - *entry_date).num_days(),
        }
    }

    /// `None` when the mark overflows.
    pub fn market_value(&self, price: Decimal) -> Option<Decimal> {
        Decimal::from(self.shares()).checked_mul(price)
    }

    /// Shares at their entry price, excluding costs.
    pub fn cost_basis(&self) -> Decimal {
        match self {
            Position::Flat => Decimal::ZERO,
            Position::Long {
                entry_price,
                shares,
                ..
            } => Decimal::from(*shares) * *entry_price,
        }
    }

    pub fn unrealized_pnl(&self, price: Decimal) -> Option<Decimal> {
        self.market_value(price)?.checked_sub(self.cost_basis())
    }
}

/// A Buy matched with its Sell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundTrip {
    pub shares: u64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    /// Buy trade value plus cost.
    pub entry_outlay: Decimal,
    /// Sell trade value minus cost.
    pub exit_proceeds: Decimal,
}

impl RoundTrip {
    pub fn net_pnl(&self) -> Decimal {
        self.exit_proceeds - self.entry_outlay
    }

    /// Price gain before costs.
    pub fn gross_gain(&self) -> Decimal {
        Decimal::from(self.shares) * (self.exit_price - self.entry_price)
    }

    pub fn is_win(&self) -> bool {
        self.net_pnl() > Decimal::ZERO
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
