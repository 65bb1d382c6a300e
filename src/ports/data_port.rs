//! Bar data access port.

use crate::domain::bar::BarSeries;
use crate::domain::error::SignalTraderError;

pub trait DataPort {
    /// Load closing prices and their signals, ascending by timestamp.
    fn fetch_bars(&self) -> Result<BarSeries, SignalTraderError>;
}
