//! RSI + moving-average signal rules.
//!
//! Flat: Buy when RSI is oversold and the fast MA is above the slow MA.
//! Long: Sell when RSI recovers past the exit level, the fast MA drops below
//! the slow MA, or the hold limit is reached. Any single Sell condition is
//! enough; they carry no priority among themselves.
//!
//! Undefined indicators never satisfy a condition. The hold limit is a pure
//! day count and fires regardless of indicator availability.

use super::market_row::MarketRow;
use super::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalRules {
    /// Buy requires `rsi < rsi_oversold`.
    pub rsi_oversold: f64,
    /// Sell when `rsi > rsi_exit`.
    pub rsi_exit: f64,
    /// Forced exit once `days_held >= max_hold_days`.
    pub max_hold_days: i64,
}

impl Default for SignalRules {
    fn default() -> Self {
        SignalRules {
            rsi_oversold: 30.0,
            rsi_exit: 50.0,
            max_hold_days: 30,
        }
    }
}

impl SignalRules {
    pub fn evaluate(&self, row: &MarketRow, position: &Position, days_held: i64) -> Signal {
        match position {
            Position::Flat => {
                let oversold = row.rsi.is_some_and(|rsi| rsi < self.rsi_oversold);
                let uptrend = matches!((row.ma_fast, row.ma_slow), (Some(fast), Some(slow)) if fast > slow);
                if oversold && uptrend {
                    Signal::Buy
                } else {
                    Signal::Hold
                }
            }
            Position::Long { .. } => {
                let momentum_exit = row.rsi.is_some_and(|rsi| rsi > self.rsi_exit);
                let trend_exit = matches!((row.ma_fast, row.ma_slow), (Some(fast), Some(slow)) if fast < slow);
                let time_exit = days_held >= self.max_hold_days;
                if momentum_exit || trend_exit || time_exit {
                    Signal::Sell
                } else {
                    Signal::Hold
                }
            }
        }
    }
}
