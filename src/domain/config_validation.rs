//! Run configuration validation.
//!
//! Checks the `[backtest]` section before any data or fee schedule is loaded.

use crate::domain::error::SignalTraderError;
use crate::domain::fee_schedule::AssetType;
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SignalTraderError> {
    validate_initial_capital(config)?;
    validate_broker(config)?;
    validate_asset_type(config)?;
    validate_risk_free_rate(config)?;
    validate_ticker(config)?;
    Ok(())
}

/// A non-empty, trimmed value for `key`, or `ConfigMissing`.
pub fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, SignalTraderError> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SignalTraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })
}

fn parse_number(config: &dyn ConfigPort, key: &str) -> Result<Option<f64>, SignalTraderError> {
    match config.get_string("backtest", key) {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| SignalTraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: key.to_string(),
                reason: format!("'{}' is not a number", s.trim()),
            }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SignalTraderError> {
    let value = parse_number(config, "initial_capital")?.ok_or_else(|| {
        SignalTraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
        }
    })?;
    if !(value.is_finite() && value > 0.0) {
        return Err(SignalTraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_broker(config: &dyn ConfigPort) -> Result<(), SignalTraderError> {
    require_string(config, "backtest", "broker").map(|_| ())
}

fn validate_asset_type(config: &dyn ConfigPort) -> Result<(), SignalTraderError> {
    match config.get_string("backtest", "asset_type") {
        None => Ok(()),
        Some(s) => s
            .parse::<AssetType>()
            .map(|_| ())
            .map_err(|e| SignalTraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "asset_type".to_string(),
                reason: e.to_string(),
            }),
    }
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), SignalTraderError> {
    let value = parse_number(config, "risk_free_rate")?.unwrap_or(0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(SignalTraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "risk_free_rate".to_string(),
            reason: "risk_free_rate must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_ticker(config: &dyn ConfigPort) -> Result<(), SignalTraderError> {
    let ticker = require_string(config, "backtest", "ticker")?;
    if ticker.contains(['/', '\\']) || ticker == "." || ticker == ".." {
        return Err(SignalTraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "ticker".to_string(),
            reason: "ticker is used in file names and may not contain path separators"
                .to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn with_backtest(lines: &str) -> FileConfigAdapter {
        make_config(&format!("[backtest]\n{lines}"))
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
initial_capital = 100000.0
broker = zerodha
asset_type = stocks
risk_free_rate = 0.05
ticker = INFY
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn optional_keys_may_be_omitted() {
        let config = with_backtest("initial_capital = 5000\nbroker = base\nticker = TCS\n");
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let config = with_backtest("initial_capital = -100\nbroker = base\nticker = TCS\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, SignalTraderError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn initial_capital_missing_fails() {
        let config = with_backtest("broker = base\nticker = TCS\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, SignalTraderError::ConfigMissing { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn initial_capital_non_numeric_fails() {
        let config = with_backtest("initial_capital = lots\nbroker = base\nticker = TCS\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(err.to_string().contains("'lots' is not a number"));
    }

    #[test]
    fn blank_broker_fails() {
        let config = with_backtest("initial_capital = 100\nbroker =   \nticker = TCS\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SignalTraderError::ConfigMissing { key, .. } if key == "broker"));
    }

    #[test]
    fn unknown_asset_type_fails() {
        let config =
            with_backtest("initial_capital = 100\nbroker = base\nasset_type = bonds\nticker = TCS\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, SignalTraderError::ConfigInvalid { key, .. } if key == "asset_type")
        );
    }

    #[test]
    fn risk_free_rate_out_of_range_fails() {
        for rate in ["1.0", "-0.01"] {
            let config = with_backtest(&format!(
                "initial_capital = 100\nbroker = base\nrisk_free_rate = {rate}\nticker = TCS\n"
            ));
            let err = validate_backtest_config(&config).unwrap_err();
            assert!(
                matches!(err, SignalTraderError::ConfigInvalid { key, .. } if key == "risk_free_rate")
            );
        }
    }

    #[test]
    fn ticker_with_path_separator_fails() {
        let config = with_backtest("initial_capital = 100\nbroker = base\nticker = ../INFY\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SignalTraderError::ConfigInvalid { key, .. } if key == "ticker"));
    }

    #[test]
    fn missing_ticker_fails() {
        let config = with_backtest("initial_capital = 100\nbroker = base\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SignalTraderError::ConfigMissing { key, .. } if key == "ticker"));
    }
}
