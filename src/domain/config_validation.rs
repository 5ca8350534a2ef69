//! Configuration validation.
//!
//! Validates every config field before a backtest runs. Keys that are absent
//! fall back to their defaults; keys that are present but malformed or out of
//! range are rejected rather than silently defaulted.

use crate::domain::error::TradingError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::str::FromStr;

pub const DATA_SOURCES: [&str; 2] = ["csv", "synthetic"];

/// Upper bound on starting capital, keeping every fill and mark well inside
/// exact decimal range.
pub const MAX_INITIAL_CAPITAL: Decimal = dec!(1000000000000000);

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TradingError> {
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    validate_indicator_config(config)?;
    validate_data_config(config)?;
    validate_ml_config(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TradingError> {
    validate_initial_capital(config)?;
    validate_cost_rate(config)?;
    validate_max_allocation(config)?;
    if let Some(symbols) = config.get_string("backtest", "symbols") {
        parse_symbols(&symbols)?;
    }
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TradingError> {
    let oversold = parsed::<f64>(config, "strategy", "rsi_oversold")?.unwrap_or(30.0);
    let exit = parsed::<f64>(config, "strategy", "rsi_exit")?.unwrap_or(50.0);

    for (key, value) in [("rsi_oversold", oversold), ("rsi_exit", exit)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid("strategy", key, format!("{} must be between 0 and 100", key)));
        }
    }
    if oversold > exit {
        return Err(invalid(
            "strategy",
            "rsi_oversold",
            "rsi_oversold must not exceed rsi_exit".to_string(),
        ));
    }

    let hold = parsed::<i64>(config, "strategy", "max_hold_days")?.unwrap_or(30);
    if hold < 1 {
        return Err(invalid(
            "strategy",
            "max_hold_days",
            "max_hold_days must be at least 1".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_indicator_config(config: &dyn ConfigPort) -> Result<(), TradingError> {
    let mut periods = Vec::with_capacity(3);
    for (key, default) in [("rsi_period", 14), ("ma_fast", 20), ("ma_slow", 50)] {
        let value = parsed::<i64>(config, "indicators", key)?.unwrap_or(default);
        if value < 1 {
            return Err(invalid("indicators", key, format!("{} must be at least 1", key)));
        }
        periods.push(value);
    }
    if periods[1] >= periods[2] {
        return Err(invalid(
            "indicators",
            "ma_fast",
            "ma_fast must be shorter than ma_slow".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), TradingError> {
    if let Some(source) = config.get_string("data", "source") {
        let source = source.trim().to_lowercase();
        if !DATA_SOURCES.contains(&source.as_str()) {
            return Err(invalid(
                "data",
                "source",
                format!("unknown source {:?}, expected one of {}", source, DATA_SOURCES.join(", ")),
            ));
        }
    }

    let days = parsed::<i64>(config, "data", "synthetic_days")?.unwrap_or(126);
    if days < 1 {
        return Err(invalid(
            "data",
            "synthetic_days",
            "synthetic_days must be at least 1".to_string(),
        ));
    }

    if let Some(start) = config.get_string("data", "synthetic_start") {
        parse_date(&start, "data", "synthetic_start")?;
    }
    Ok(())
}

pub fn validate_ml_config(config: &dyn ConfigPort) -> Result<(), TradingError> {
    for (symbol, value) in config.get_section("ml") {
        let accuracy = value.trim().parse::<f64>().map_err(|_| {
            invalid("ml", &symbol, format!("accuracy {:?} is not a number", value))
        })?;
        if !(0.0..=1.0).contains(&accuracy) {
            return Err(invalid("ml", &symbol, "accuracy must be between 0 and 1".to_string()));
        }
    }
    Ok(())
}

/// Split a comma-separated symbol list. Symbols are trimmed and upper-cased;
/// empty entries and duplicates are rejected.
pub fn parse_symbols(list: &str) -> Result<Vec<String>, TradingError> {
    let mut seen = HashSet::new();
    let mut symbols = Vec::new();
    for raw in list.split(',') {
        let symbol = raw.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(invalid("backtest", "symbols", "empty symbol in list".to_string()));
        }
        if !seen.insert(symbol.clone()) {
            return Err(invalid("backtest", "symbols", format!("duplicate symbol {}", symbol)));
        }
        symbols.push(symbol);
    }
    Ok(symbols)
}

pub fn parse_date(value: &str, section: &str, key: &str) -> Result<NaiveDate, TradingError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(section, key, format!("invalid {} format, expected YYYY-MM-DD", key)))
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), TradingError> {
    if let Some(value) = parsed::<Decimal>(config, "backtest", "initial_capital")? {
        if value <= Decimal::ZERO {
            return Err(invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be positive".to_string(),
            ));
        }
        if value > MAX_INITIAL_CAPITAL {
            return Err(invalid(
                "backtest",
                "initial_capital",
                format!("initial_capital must not exceed {}", MAX_INITIAL_CAPITAL),
            ));
        }
    }
    Ok(())
}

fn validate_cost_rate(config: &dyn ConfigPort) -> Result<(), TradingError> {
    if let Some(value) = parsed::<Decimal>(config, "backtest", "cost_rate")? {
        if value < Decimal::ZERO || value >= Decimal::ONE {
            return Err(invalid(
                "backtest",
                "cost_rate",
                "cost_rate must be in [0, 1)".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_max_allocation(config: &dyn ConfigPort) -> Result<(), TradingError> {
    if let Some(value) = parsed::<Decimal>(config, "backtest", "max_allocation")? {
        if value <= Decimal::ZERO || value > Decimal::ONE {
            return Err(invalid(
                "backtest",
                "max_allocation",
                "max_allocation must be in (0, 1]".to_string(),
            ));
        }
    }
    Ok(())
}

/// `None` when the key is absent; an error when present but unparsable.
fn parsed<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, TradingError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("cannot parse {:?}", raw))),
    }
}

fn invalid(section: &str, key: &str, reason: String) -> TradingError {
    TradingError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}
