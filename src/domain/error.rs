//! Domain error types.

/// Failure to turn a fee schedule into effective rates for one
/// (broker, asset) pair.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("broker '{broker}' not found in fee schedule")]
    UnknownBroker { broker: String },

    #[error("broker '{broker}' inherits from unknown broker '{parent}'")]
    UnknownParent { broker: String, parent: String },

    #[error("inheritance cycle detected at broker '{broker}'")]
    InheritanceCycle { broker: String },

    #[error("inheritance chain for broker '{broker}' exceeds {max_depth} levels")]
    InheritanceTooDeep { broker: String, max_depth: usize },

    #[error("asset type '{asset}' configuration not found in schedule for broker '{broker}'")]
    AssetNotConfigured { broker: String, asset: String },

    #[error("malformed fee schedule for broker '{broker}': {reason}")]
    Malformed { broker: String, reason: String },
}

/// Failure of a single fee calculation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeeError {
    #[error("principal value must be positive, got {principal}")]
    InvalidInput { principal: f64 },

    #[error(transparent)]
    ScheduleNotFound(#[from] ResolveError),
}

/// Top-level error type for signaltrader.
#[derive(Debug, thiserror::Error)]
pub enum SignalTraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("fee schedule error in {file}: {reason}")]
    FeeSchedule { file: String, reason: String },

    #[error(transparent)]
    Fee(#[from] FeeError),

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("price series has {prices} bars but signal series has {signals}")]
    SeriesLengthMismatch { prices: usize, signals: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SignalTraderError {
    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            SignalTraderError::Io(_) => 1,
            SignalTraderError::ConfigParse { .. }
            | SignalTraderError::ConfigMissing { .. }
            | SignalTraderError::ConfigInvalid { .. } => 2,
            SignalTraderError::FeeSchedule { .. } | SignalTraderError::Fee(_) => 3,
            SignalTraderError::Data { .. } => 4,
            SignalTraderError::SeriesLengthMismatch { .. } => 5,
        }
    }
}

impl From<&SignalTraderError> for std::process::ExitCode {
    fn from(err: &SignalTraderError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_error_messages_name_the_broker() {
        let err = ResolveError::UnknownBroker {
            broker: "acme".into(),
        };
        assert_eq!(err.to_string(), "broker 'acme' not found in fee schedule");

        let err = ResolveError::AssetNotConfigured {
            broker: "zerodha".into(),
            asset: "options".into(),
        };
        assert!(err.to_string().contains("'options'"));
        assert!(err.to_string().contains("'zerodha'"));
    }

    #[test]
    fn fee_error_wraps_resolve_error_transparently() {
        let inner = ResolveError::InheritanceCycle {
            broker: "a".into(),
        };
        let err: FeeError = inner.clone().into();
        assert_eq!(err.to_string(), inner.to_string());
        assert_eq!(err, FeeError::ScheduleNotFound(inner));
    }

    #[test]
    fn exit_codes_group_by_category() {
        let io = SignalTraderError::Io(std::io::Error::other("boom"));
        let cfg = SignalTraderError::ConfigMissing {
            section: "backtest".into(),
            key: "broker".into(),
        };
        let mismatch = SignalTraderError::SeriesLengthMismatch {
            prices: 3,
            signals: 2,
        };
        let fee = SignalTraderError::Fee(FeeError::InvalidInput { principal: 0.0 });
        assert_eq!(io.exit_status(), 1);
        assert_eq!(cfg.exit_status(), 2);
        assert_eq!(fee.exit_status(), 3);
        assert_eq!(mismatch.exit_status(), 5);
    }
}
