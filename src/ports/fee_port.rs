//! Transaction fee port consumed by the simulator.

use chrono::NaiveDateTime;

use crate::domain::commission::{FeeOutcome, TradeSide};
use crate::domain::error::FeeError;

/// Source of transaction fees for a single broker and asset type.
pub trait FeePort {
    /// Fee for trading `principal` on `side`. `entry` and `exit` bound the
    /// holding period when known.
    fn transaction_fee(
        &self,
        principal: f64,
        side: TradeSide,
        entry: Option<NaiveDateTime>,
        exit: Option<NaiveDateTime>,
    ) -> Result<FeeOutcome, FeeError>;
}
