//! CSV bar file adapter.
//!
//! Expects a header row naming `timestamp`, `close` and `signal` columns in
//! any order. An empty close is read as NaN; an empty signal as no action.

use crate::domain::bar::{BarSeries, PriceBar};
use crate::domain::commission::parse_timestamp;
use crate::domain::error::SignalTraderError;
use crate::domain::signal::Signal;
use crate::ports::data_port::DataPort;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct BarRow {
    timestamp: String,
    close: Option<f64>,
    #[serde(default)]
    signal: String,
}

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn parse(&self, content: &str) -> Result<BarSeries, SignalTraderError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut rows = Vec::new();

        for (index, result) in rdr.deserialize::<BarRow>().enumerate() {
            // Header is line 1.
            let line = index + 2;
            let row = result.map_err(|e| SignalTraderError::Data {
                reason: format!("{}: CSV parse error: {}", self.path.display(), e),
            })?;

            let timestamp =
                parse_timestamp(&row.timestamp).ok_or_else(|| SignalTraderError::Data {
                    reason: format!(
                        "{} line {}: invalid timestamp '{}'",
                        self.path.display(),
                        line,
                        row.timestamp
                    ),
                })?;
            let signal: Signal = row.signal.parse().map_err(|e| SignalTraderError::Data {
                reason: format!("{} line {}: {}", self.path.display(), line, e),
            })?;

            rows.push((
                PriceBar {
                    timestamp,
                    close: row.close.unwrap_or(f64::NAN),
                },
                signal,
            ));
        }

        debug!(path = %self.path.display(), bars = rows.len(), "loaded bars");
        Ok(BarSeries::from_rows(rows))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self) -> Result<BarSeries, SignalTraderError> {
        let content = fs::read_to_string(&self.path).map_err(|e| SignalTraderError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        self.parse(&content)
    }
}
