#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde_json::{Value, json};
use signaltrader::domain::bar::{BarSeries, PriceBar};
use signaltrader::domain::commission::{CommissionCalculator, FeeOutcome, TradeSide};
use signaltrader::domain::error::{FeeError, ResolveError, SignalTraderError};
use signaltrader::domain::fee_schedule::{AssetType, FeeSchedule};
use signaltrader::domain::signal::Signal;
use signaltrader::ports::data_port::DataPort;
use signaltrader::ports::fee_port::FeePort;

pub fn schedule_json() -> Value {
    json!({
        "base": {
            "stocks": {
                "broker": { "rate_buy": 0.005, "rate_sell": 0.005, "const_buy": 0.0, "const_sell": 0.0 },
                "regulatory": {
                    "etc_rate": 0.0000297,
                    "sebi_rate": 0.000001,
                    "stamp_duty_rate": 0.00015,
                    "gst_rate": 0.18,
                    "stt_delivery": 0.001,
                    "stt_intraday": 0.00025
                }
            },
            "options": { "broker": { "const_buy": 20.0, "const_sell": 20.0 } }
        },
        "zerodha": {
            "inherits_from": "base",
            "stocks": { "broker": { "rate_buy": 0.0, "rate_sell": 0.0 } }
        }
    })
}

pub fn schedule() -> FeeSchedule {
    FeeSchedule::from_value(schedule_json()).unwrap()
}

pub fn calculator() -> CommissionCalculator {
    CommissionCalculator::new(schedule())
}

pub fn day(offset: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + TimeDelta::days(offset)
}

/// One bar per calendar day at midnight.
pub fn daily_bars(prices: &[f64]) -> Vec<PriceBar> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: day(i as i64),
            close,
        })
        .collect()
}

/// Hourly bars within a single trading day, starting 09:15.
pub fn intraday_bars(prices: &[f64]) -> Vec<PriceBar> {
    let open = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap();
    prices
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: open + TimeDelta::hours(i as i64),
            close,
        })
        .collect()
}

/// Total fee as the calculator would charge it, for cross-checking fills.
pub fn expected_fee(
    broker: &str,
    principal: f64,
    side: TradeSide,
    entry: Option<NaiveDateTime>,
    exit: Option<NaiveDateTime>,
) -> f64 {
    calculator()
        .calculate(broker, principal, side, AssetType::Stocks, entry, exit)
        .unwrap()
        .total()
        .unwrap()
}

pub struct MockDataPort {
    pub series: Option<BarSeries>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<PriceBar>, signals: Vec<Signal>) -> Self {
        Self {
            series: Some(BarSeries::new(bars, signals).unwrap()),
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            series: None,
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self) -> Result<BarSeries, SignalTraderError> {
        if let Some(reason) = &self.error {
            return Err(SignalTraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.series.clone().unwrap_or_default())
    }
}

/// Fee port whose every call fails to resolve the broker.
pub struct FailingFees;

impl FeePort for FailingFees {
    fn transaction_fee(
        &self,
        _principal: f64,
        _side: TradeSide,
        _entry: Option<NaiveDateTime>,
        _exit: Option<NaiveDateTime>,
    ) -> Result<FeeOutcome, FeeError> {
        Err(FeeError::ScheduleNotFound(ResolveError::UnknownBroker {
            broker: "ghost".into(),
        }))
    }
}
