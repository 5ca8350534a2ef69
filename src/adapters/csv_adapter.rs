//! CSV file indicator source.
//!
//! Reads `<dir>/<SYMBOL>.csv` with a `date,open,high,low,close,volume`
//! header. When the file also carries `rsi`, `ma_fast` and `ma_slow` columns
//! those values are used as delivered (blank, `NaN` or `null` meaning
//! undefined); otherwise the indicators are computed from the closes.
//!
//! A blank, `NaN` or `null` price cell is a bad tick, not a bad file: the
//! cell reads as zero, so the row fails `has_valid_price` and the simulator
//! holds through it. Any other unparsable text is an input error.

use crate::domain::error::TradingError;
use crate::domain::indicator::{IndicatorParams, apply_indicators};
use crate::domain::market_row::MarketRow;
use crate::ports::indicator_port::IndicatorSource;
use chrono::NaiveDate;
use csv::StringRecord;
use rust_decimal::Decimal;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

const PRICE_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvSource {
    base_path: PathBuf,
    params: IndicatorParams,
}

impl CsvSource {
    pub fn new(base_path: PathBuf, params: IndicatorParams) -> Self {
        Self { base_path, params }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

/// Column positions resolved from the header row.
struct Columns {
    price: [usize; 6],
    indicators: Option<[usize; 3]>,
}

impl Columns {
    fn from_header(symbol: &str, header: &StringRecord) -> Result<Self, TradingError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let mut price = [0usize; 6];
        for (slot, name) in price.iter_mut().zip(PRICE_COLUMNS) {
            *slot = find(name).ok_or_else(|| input_error(symbol, format!("missing {} column", name)))?;
        }

        let indicators = match (find("rsi"), find("ma_fast"), find("ma_slow")) {
            (Some(rsi), Some(fast), Some(slow)) => Some([rsi, fast, slow]),
            _ => None,
        };

        Ok(Columns { price, indicators })
    }
}

fn input_error(symbol: &str, reason: String) -> TradingError {
    TradingError::InputData {
        symbol: symbol.to_string(),
        reason,
    }
}

fn field<'r>(
    symbol: &str,
    record: &'r StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<&'r str, TradingError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| input_error(symbol, format!("line {}: missing {} value", line, name)))
}

/// Cells a feed uses for "no value".
fn is_missing(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("nan") || value.eq_ignore_ascii_case("null")
}

fn parse_price(symbol: &str, value: &str, name: &str, line: usize) -> Result<Decimal, TradingError> {
    if is_missing(value) {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|e| input_error(symbol, format!("line {}: invalid {} value {:?}: {}", line, name, value, e)))
}

fn parse_volume(symbol: &str, value: &str, line: usize) -> Result<u64, TradingError> {
    if is_missing(value) {
        return Ok(0);
    }
    if let Ok(volume) = value.parse::<u64>() {
        return Ok(volume);
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => Ok(v as u64),
        Ok(_) => Err(input_error(
            symbol,
            format!("line {}: volume {:?} is not a non-negative whole number", line, value),
        )),
        Err(e) => Err(input_error(
            symbol,
            format!("line {}: invalid volume {:?}: {}", line, value, e),
        )),
    }
}

/// Missing cells are undefined. Out-of-range values are dropped later by
/// [`MarketRow::with_indicators`].
fn parse_indicator(
    symbol: &str,
    value: &str,
    name: &str,
    line: usize,
) -> Result<Option<f64>, TradingError> {
    if is_missing(value) {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|e| input_error(symbol, format!("line {}: invalid {} value {:?}: {}", line, name, value, e)))
}

impl IndicatorSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn load(&self, symbol: &str) -> Result<Vec<MarketRow>, TradingError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TradingError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let header = rdr
            .headers()
            .map_err(|e| input_error(symbol, format!("CSV header error: {}", e)))?
            .clone();
        let columns = Columns::from_header(symbol, &header)?;

        let mut rows = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let line = i + 2;
            let record = result.map_err(|e| input_error(symbol, format!("CSV parse error: {}", e)))?;
            let [date_idx, open_idx, high_idx, low_idx, close_idx, volume_idx] = columns.price;

            let date_str = field(symbol, &record, date_idx, "date", line)?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                input_error(symbol, format!("line {}: invalid date {:?}: {}", line, date_str, e))
            })?;

            let price = |idx: usize, name: &str| -> Result<Decimal, TradingError> {
                parse_price(symbol, field(symbol, &record, idx, name, line)?, name, line)
            };
            let open = price(open_idx, "open")?;
            let high = price(high_idx, "high")?;
            let low = price(low_idx, "low")?;
            let close = price(close_idx, "close")?;
            let volume = parse_volume(symbol, field(symbol, &record, volume_idx, "volume", line)?, line)?;

            let mut row = MarketRow::new(date, open, high, low, close, volume);
            if let Some([rsi_idx, fast_idx, slow_idx]) = columns.indicators {
                let value = |idx: usize, name: &str| -> Result<Option<f64>, TradingError> {
                    parse_indicator(symbol, field(symbol, &record, idx, name, line)?, name, line)
                };
                row = row.with_indicators(
                    value(rsi_idx, "rsi")?,
                    value(fast_idx, "ma_fast")?,
                    value(slow_idx, "ma_slow")?,
                );
            }
            if !row.has_valid_price() {
                debug!(symbol, line, date = %row.date, "bad tick, close unusable");
            }
            rows.push(row);
        }

        debug!(symbol, rows = rows.len(), path = %path.display(), "loaded csv series");

        if columns.indicators.is_some() {
            Ok(rows)
        } else {
            Ok(apply_indicators(rows, &self.params))
        }
    }
}
