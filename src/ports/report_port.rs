//! Report generation port.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradingError;
use crate::domain::metrics::PortfolioSummary;

/// Port for rendering backtest output. Implementations only format; they
/// never recompute results.
pub trait ReportPort {
    fn write(
        &self,
        results: &[BacktestResult],
        summary: &PortfolioSummary,
    ) -> Result<(), TradingError>;
}
