//! Indian equity transaction fees.
//!
//! [`CommissionCalculator`] resolves every (broker, asset) pair of a
//! [`FeeSchedule`] once at construction and computes a [`FeeBreakdown`] per
//! transaction. Only stocks are priced; other asset types report
//! [`FeeOutcome::NotImplemented`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::error::{FeeError, ResolveError};
use super::fee_schedule::{AssetType, EffectiveRates, FeeSchedule, resolve};
use crate::ports::fee_port::FeePort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown trade side '{0}' (expected buy or sell)")]
pub struct TradeSideParseError(pub String);

impl FromStr for TradeSide {
    type Err = TradeSideParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(TradeSide::Buy),
            "sell" => Ok(TradeSide::Sell),
            _ => Err(TradeSideParseError(s.to_string())),
        }
    }
}

/// How long a stock position was held, which decides STT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HoldingType {
    Delivery,
    Intraday,
    Unknown,
}

impl HoldingType {
    /// Classify a holding period from its entry and exit timestamps.
    ///
    /// Delivery requires the exit to be at least a day after the entry and on
    /// a later calendar date. Anything shorter, including an exit at or before
    /// the entry, is intraday. A missing timestamp gives `Unknown`.
    pub fn classify(entry: Option<NaiveDateTime>, exit: Option<NaiveDateTime>) -> HoldingType {
        let (Some(entry), Some(exit)) = (entry, exit) else {
            return HoldingType::Unknown;
        };
        if exit <= entry {
            return HoldingType::Intraday;
        }
        if entry.date() == exit.date() || exit - entry < TimeDelta::days(1) {
            return HoldingType::Intraday;
        }
        HoldingType::Delivery
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HoldingType::Delivery => "DELIVERY",
            HoldingType::Intraday => "INTRADAY",
            HoldingType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for HoldingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// Parse an ISO-8601 style timestamp. A bare date is taken as midnight.
/// Offset timestamps (`+05:30`, `Z`) keep their local wall-clock time.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .or_else(|| {
                    OFFSET_FORMATS
                        .iter()
                        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
                })
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Per-component fees for one stock transaction, at full precision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeBreakdown {
    pub asset: AssetType,
    pub side: TradeSide,
    pub holding: HoldingType,
    pub principal: f64,
    pub brokerage: f64,
    pub exchange_fee: f64,
    pub sebi_fee: f64,
    pub stamp_duty: f64,
    pub gst: f64,
    pub stt: f64,
    pub total: f64,
}

impl FeeBreakdown {
    /// Report rows, amounts rounded to 2 dp.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let asset = self.asset.as_str();
        let mut asset_label = asset[..1].to_ascii_uppercase();
        asset_label.push_str(&asset[1..]);

        vec![
            ("Asset Type", asset_label),
            ("Trade Side", self.side.to_string()),
            ("Holding Type", self.holding.to_string()),
            ("Principal Value (₹)", format!("{:.2}", self.principal)),
            ("Primary Brokerage (₹)", format!("{:.2}", self.brokerage)),
            (
                "Exchange Transaction Charges (₹)",
                format!("{:.2}", self.exchange_fee),
            ),
            ("SEBI Turnover Fee (₹)", format!("{:.2}", self.sebi_fee)),
            ("Stamp Duty (₹)", format!("{:.2}", self.stamp_duty)),
            ("GST (₹)", format!("{:.2}", self.gst)),
            (
                "STT (Securities Transaction Tax) (₹)",
                format!("{:.2}", self.stt),
            ),
            ("TOTAL TRANSACTION FEE (₹)", format!("{:.2}", self.total)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeeOutcome {
    Computed(FeeBreakdown),
    NotImplemented { asset: AssetType },
}

impl FeeOutcome {
    pub fn total(&self) -> Option<f64> {
        match self {
            FeeOutcome::Computed(breakdown) => Some(breakdown.total),
            FeeOutcome::NotImplemented { .. } => None,
        }
    }
}

/// Stock fee algorithm over already-resolved rates.
pub fn stock_fees(
    principal: f64,
    side: TradeSide,
    holding: HoldingType,
    rates: &EffectiveRates,
) -> FeeBreakdown {
    let broker = &rates.broker;
    let reg = &rates.regulatory;

    let (rate, constant, cap) = match side {
        TradeSide::Buy => (broker.rate_buy, broker.const_buy, broker.cap_buy),
        TradeSide::Sell => (broker.rate_sell, broker.const_sell, broker.cap_sell),
    };
    let mut brokerage = (principal * rate).max(constant);
    if let Some(cap) = cap
        && brokerage > cap
    {
        brokerage = cap;
    }

    let exchange_fee = principal * reg.etc_rate;
    let sebi_fee = principal * reg.sebi_rate;
    let stamp_duty = match side {
        TradeSide::Buy => principal * reg.stamp_duty_rate,
        TradeSide::Sell => 0.0,
    };
    let gst = (brokerage + exchange_fee + sebi_fee) * reg.gst_rate;
    let stt = match (holding, side) {
        (HoldingType::Delivery, TradeSide::Sell) => principal * reg.stt_delivery,
        (HoldingType::Delivery, TradeSide::Buy) => 0.0,
        (HoldingType::Intraday, _) => principal * reg.stt_intraday,
        (HoldingType::Unknown, _) => 0.0,
    };

    FeeBreakdown {
        asset: AssetType::Stocks,
        side,
        holding,
        principal,
        brokerage,
        exchange_fee,
        sebi_fee,
        stamp_duty,
        gst,
        stt,
        total: brokerage + exchange_fee + sebi_fee + stamp_duty + gst + stt,
    }
}

/// Immutable fee engine over one fee schedule.
#[derive(Debug, Clone)]
pub struct CommissionCalculator {
    schedule: FeeSchedule,
    resolved: HashMap<(String, AssetType), Result<EffectiveRates, ResolveError>>,
}

impl CommissionCalculator {
    pub fn new(schedule: FeeSchedule) -> Self {
        let mut resolved = HashMap::new();
        for broker in schedule.brokers() {
            for asset in AssetType::ALL {
                resolved.insert(
                    (broker.to_string(), asset),
                    resolve(&schedule, broker, asset),
                );
            }
        }
        CommissionCalculator { schedule, resolved }
    }

    /// Effective rates for `broker` and `asset`.
    pub fn rates(&self, broker: &str, asset: AssetType) -> Result<EffectiveRates, ResolveError> {
        match self.resolved.get(&(broker.to_string(), asset)) {
            Some(result) => result.clone(),
            None => resolve(&self.schedule, broker, asset),
        }
    }

    /// Resolution results for every (broker, asset) pair, sorted.
    pub fn resolution_report(&self) -> Vec<(&str, AssetType, &Result<EffectiveRates, ResolveError>)> {
        let mut report: Vec<_> = self
            .resolved
            .iter()
            .map(|((broker, asset), result)| (broker.as_str(), *asset, result))
            .collect();
        report.sort_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(&b.1)));
        report
    }

    /// Fee for one transaction of `principal` on `side`.
    pub fn calculate(
        &self,
        broker: &str,
        principal: f64,
        side: TradeSide,
        asset: AssetType,
        entry: Option<NaiveDateTime>,
        exit: Option<NaiveDateTime>,
    ) -> Result<FeeOutcome, FeeError> {
        if !(principal.is_finite() && principal > 0.0) {
            return Err(FeeError::InvalidInput { principal });
        }

        let rates = self.rates(broker, asset)?;
        let holding = HoldingType::classify(entry, exit);

        match asset {
            AssetType::Stocks => Ok(FeeOutcome::Computed(stock_fees(
                principal, side, holding, &rates,
            ))),
            AssetType::Options | AssetType::Currency | AssetType::Crypto => {
                Ok(FeeOutcome::NotImplemented { asset })
            }
        }
    }

    /// A fee source bound to one broker and asset type.
    pub fn for_broker(&self, broker: &str, asset: AssetType) -> BrokerFees<'_> {
        BrokerFees {
            calculator: self,
            broker: broker.to_string(),
            asset,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrokerFees<'a> {
    calculator: &'a CommissionCalculator,
    broker: String,
    asset: AssetType,
}

impl FeePort for BrokerFees<'_> {
    fn transaction_fee(
        &self,
        principal: f64,
        side: TradeSide,
        entry: Option<NaiveDateTime>,
        exit: Option<NaiveDateTime>,
    ) -> Result<FeeOutcome, FeeError> {
        self.calculator
            .calculate(&self.broker, principal, side, self.asset, entry, exit)
    }
}
