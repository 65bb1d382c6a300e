//! Price bars and their index-aligned signals.

use chrono::NaiveDateTime;

use super::error::SignalTraderError;
use super::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub close: f64,
}

/// Closing prices in ascending time order with one signal per bar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSeries {
    bars: Vec<PriceBar>,
    signals: Vec<Signal>,
}

impl BarSeries {
    pub fn new(bars: Vec<PriceBar>, signals: Vec<Signal>) -> Result<Self, SignalTraderError> {
        if bars.len() != signals.len() {
            return Err(SignalTraderError::SeriesLengthMismatch {
                prices: bars.len(),
                signals: signals.len(),
            });
        }
        Ok(BarSeries { bars, signals })
    }

    /// Build from (bar, signal) rows, ordering them by timestamp. Rows with
    /// equal timestamps keep their input order.
    pub fn from_rows(mut rows: Vec<(PriceBar, Signal)>) -> Self {
        rows.sort_by_key(|(bar, _)| bar.timestamp);
        let (bars, signals) = rows.into_iter().unzip();
        BarSeries { bars, signals }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
