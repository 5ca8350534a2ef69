//! Domain error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::trade::TradeAction;

/// Top-level error type for algotrader.
#[derive(Debug, thiserror::Error)]
pub enum TradingError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    /// The indicator source could not deliver a series at all.
    #[error("data source error: {reason}")]
    Data { reason: String },

    /// The delivered series is unusable; fatal for that symbol only.
    #[error("input data error for {symbol}: {reason}")]
    InputData { symbol: String, reason: String },

    /// Buy-while-Long or Sell-while-Flat. Always a logic defect.
    #[error("invalid transition for {symbol} on {date}: {action} while {state}")]
    InvalidTransition {
        symbol: String,
        date: NaiveDate,
        action: TradeAction,
        state: &'static str,
    },

    #[error("cash conservation violated for {symbol} on {date}: expected {expected}, found {actual}")]
    ConservationViolated {
        symbol: String,
        date: NaiveDate,
        expected: Decimal,
        actual: Decimal,
    },

    #[error("report error: {reason}")]
    Report { reason: String },
}

impl TradingError {
    /// Errors that only invalidate the symbol being simulated. Everything else
    /// aborts the whole batch.
    pub fn is_symbol_scoped(&self) -> bool {
        matches!(
            self,
            TradingError::InputData { .. } | TradingError::Data { .. }
        )
    }
}

impl From<&TradingError> for std::process::ExitCode {
    fn from(err: &TradingError) -> Self {
        let code: u8 = match err {
            TradingError::Report { .. } => 1,
            TradingError::ConfigParse { .. } | TradingError::ConfigInvalid { .. } => 2,
            TradingError::Data { .. } => 3,
            TradingError::InputData { .. } => 5,
            TradingError::InvalidTransition { .. } | TradingError::ConservationViolated { .. } => {
                6
            }
        };
        std::process::ExitCode::from(code)
    }
}
