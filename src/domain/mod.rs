//! Core domain types and logic: signal rules, position tracking, the
//! backtest simulator and performance aggregation.

pub mod market_row;
pub mod indicator;
pub mod signal;
pub mod position;
pub mod trade;
pub mod portfolio;
pub mod execution;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
