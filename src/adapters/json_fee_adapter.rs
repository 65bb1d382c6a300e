//! JSON fee schedule loader.

use crate::domain::error::SignalTraderError;
use crate::domain::fee_schedule::FeeSchedule;
use std::fs;
use std::path::Path;

/// Read and parse a fee schedule document.
pub fn load_fee_schedule<P: AsRef<Path>>(path: P) -> Result<FeeSchedule, SignalTraderError> {
    let path = path.as_ref();
    let schedule_error = |reason: String| SignalTraderError::FeeSchedule {
        file: path.display().to_string(),
        reason,
    };
    let content = fs::read_to_string(path).map_err(|e| schedule_error(e.to_string()))?;
    FeeSchedule::from_json_str(&content).map_err(|e| schedule_error(e.to_string()))
}
