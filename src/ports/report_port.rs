//! Report output port.

use std::path::PathBuf;

use crate::domain::error::SignalTraderError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::position::CompletedTrade;

/// Port for persisting a finished backtest's summary and trade ledger.
pub trait ReportPort {
    /// Write the report for `ticker` and return the paths written.
    fn write(
        &self,
        ticker: &str,
        summary: &PerformanceSummary,
        trades: &[CompletedTrade],
    ) -> Result<Vec<PathBuf>, SignalTraderError>;
}
