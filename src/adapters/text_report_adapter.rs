//! Plain-text summary and CSV trade ledger adapter implementing ReportPort.

use std::fs;
use std::path::PathBuf;

use crate::domain::error::SignalTraderError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::position::CompletedTrade;
use crate::ports::report_port::ReportPort;

pub struct TextReportAdapter {
    output_dir: PathBuf,
}

impl TextReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn summary_path(&self, ticker: &str) -> PathBuf {
        self.output_dir.join(format!("{ticker}_summary.txt"))
    }

    pub fn trades_path(&self, ticker: &str) -> PathBuf {
        self.output_dir.join(format!("{ticker}_trades.csv"))
    }

    fn write_trades(&self, ticker: &str, trades: &[CompletedTrade]) -> Result<PathBuf, SignalTraderError> {
        let path = self.trades_path(ticker);
        let csv_error = |e: csv::Error| SignalTraderError::Io(std::io::Error::other(e));

        let mut writer = csv::Writer::from_path(&path).map_err(csv_error)?;
        for trade in trades {
            writer.serialize(trade).map_err(csv_error)?;
        }
        writer.flush()?;
        Ok(path)
    }
}

/// `Label: value` lines for a summary, headed by the ticker.
pub fn render_summary(ticker: &str, summary: &PerformanceSummary) -> String {
    let mut out = format!("--- Backtest Summary: {ticker} ---\n");
    out.extend(
        summary
            .rows()
            .into_iter()
            .map(|(label, value)| format!("{label}: {value}\n")),
    );
    if summary.open_position {
        out.push_str("Open Position: yes (not included in trade statistics)\n");
    }
    out
}

impl ReportPort for TextReportAdapter {
    fn write(
        &self,
        ticker: &str,
        summary: &PerformanceSummary,
        trades: &[CompletedTrade],
    ) -> Result<Vec<PathBuf>, SignalTraderError> {
        fs::create_dir_all(&self.output_dir)?;

        let summary_path = self.summary_path(ticker);
        fs::write(&summary_path, render_summary(ticker, summary))?;
        let mut written = vec![summary_path];

        if !trades.is_empty() {
            written.push(self.write_trades(ticker, trades)?);
        }
        Ok(written)
    }
}
