//! CSV report adapter.
//!
//! Writes four files into the output directory:
//! `trades.csv`, `performance.csv`, `equity.csv` and `summary.csv`.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradingError;
use crate::domain::metrics::{PortfolioSummary, SymbolMetrics};
use crate::ports::report_port::ReportPort;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const TRADES_FILE: &str = "trades.csv";
pub const PERFORMANCE_FILE: &str = "performance.csv";
pub const EQUITY_FILE: &str = "equity.csv";
pub const SUMMARY_FILE: &str = "summary.csv";

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

#[derive(Serialize)]
struct PerformanceRow<'a> {
    symbol: &'a str,
    return_pct: Decimal,
    num_trades: usize,
    round_trips: usize,
    wins: usize,
    win_rate_pct: String,
    net_pnl: Decimal,
    total_costs: Decimal,
    max_drawdown_pct: String,
    avg_holding_days: String,
    unrealized: bool,
}

#[derive(Serialize)]
struct EquityRow<'a> {
    symbol: &'a str,
    date: NaiveDate,
    cash: Decimal,
    shares: u64,
    value: Decimal,
}

fn report_err(path: &Path, e: impl std::fmt::Display) -> TradingError {
    TradingError::Report {
        reason: format!("{}: {}", path.display(), e),
    }
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write_rows<T: Serialize>(&self, file: &str, rows: impl IntoIterator<Item = T>) -> Result<(), TradingError> {
        let path = self.output_dir.join(file);
        let mut wtr = csv::Writer::from_path(&path).map_err(|e| report_err(&path, e))?;
        for row in rows {
            wtr.serialize(row).map_err(|e| report_err(&path, e))?;
        }
        wtr.flush().map_err(|e| report_err(&path, e))?;
        Ok(())
    }

    fn write_summary(&self, summary: &PortfolioSummary) -> Result<(), TradingError> {
        let path = self.output_dir.join(SUMMARY_FILE);
        let mut wtr = csv::Writer::from_path(&path).map_err(|e| report_err(&path, e))?;

        let mut record = |key: &str, value: String| {
            wtr.write_record([key, value.as_str()])
                .map_err(|e| report_err(&path, e))
        };

        record("key", "value".to_string())?;
        record("timestamp", summary.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string())?;
        record("symbols_analyzed", summary.symbols_analyzed.to_string())?;
        record("avg_return_pct", summary.avg_return.round_dp(4).normalize().to_string())?;
        record("total_trades", summary.total_trades.to_string())?;
        record("win_rate_pct", format!("{:.2}", summary.win_rate * 100.0))?;
        record(
            "avg_ml_accuracy_pct",
            summary
                .avg_ml_accuracy
                .map(|a| format!("{:.2}", a))
                .unwrap_or_default(),
        )?;
        record("best_symbol", summary.best_symbol.clone().unwrap_or_default())?;
        record("worst_symbol", summary.worst_symbol.clone().unwrap_or_default())?;
        for failed in &summary.failed_symbols {
            record(&format!("failed:{}", failed.symbol), failed.reason.clone())?;
        }

        wtr.flush().map_err(|e| report_err(&path, e))?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        results: &[BacktestResult],
        summary: &PortfolioSummary,
    ) -> Result<(), TradingError> {
        fs::create_dir_all(&self.output_dir).map_err(|e| report_err(&self.output_dir, e))?;

        self.write_rows(TRADES_FILE, results.iter().flat_map(|r| r.trades.iter()))?;

        let metrics: Vec<SymbolMetrics> = results.iter().map(SymbolMetrics::compute).collect();
        self.write_rows(
            PERFORMANCE_FILE,
            metrics.iter().map(|m| PerformanceRow {
                symbol: &m.symbol,
                return_pct: m.return_pct.round_dp(4).normalize(),
                num_trades: m.num_trades,
                round_trips: m.round_trips,
                wins: m.wins,
                win_rate_pct: format!("{:.2}", m.win_rate * 100.0),
                net_pnl: m.net_pnl.round_dp(2),
                total_costs: m.total_costs.round_dp(2),
                max_drawdown_pct: format!("{:.2}", m.max_drawdown * 100.0),
                avg_holding_days: format!("{:.1}", m.avg_holding_days),
                unrealized: m.unrealized,
            }),
        )?;

        self.write_rows(
            EQUITY_FILE,
            results.iter().flat_map(|r| {
                r.equity_curve.iter().map(move |p| EquityRow {
                    symbol: &r.symbol,
                    date: p.date,
                    cash: p.cash.round_dp(2),
                    shares: p.shares,
                    value: p.value.round_dp(2),
                })
            }),
        )?;

        self.write_summary(summary)?;

        info!(dir = %self.output_dir.display(), symbols = results.len(), "report written");
        Ok(())
    }
}
