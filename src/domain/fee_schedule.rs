//! Hierarchical fee schedules and their resolution into effective rates.
//!
//! A schedule maps broker ids to fragments keyed by asset type. A fragment
//! may name a parent broker via `inherits_from`. Resolution for a
//! (broker, asset) pair:
//!
//! 1. walk the inheritance chain and shallow-merge the top-level asset
//!    sections, descendants overriding ancestors;
//! 2. deep-merge the chosen asset section onto the `base` broker's section
//!    for the same asset;
//! 3. require a non-empty `broker` or `regulatory` section;
//! 4. decode into typed [`EffectiveRates`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::error::ResolveError;

pub const BASE_BROKER: &str = "base";
pub const INHERITS_FROM: &str = "inherits_from";
pub const MAX_INHERITANCE_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Stocks,
    Options,
    Currency,
    Crypto,
}

impl AssetType {
    pub const ALL: [AssetType; 4] = [
        AssetType::Stocks,
        AssetType::Options,
        AssetType::Currency,
        AssetType::Crypto,
    ];

    /// Section key used in fee schedule documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Stocks => "stocks",
            AssetType::Options => "options",
            AssetType::Currency => "currency",
            AssetType::Crypto => "crypto",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown asset type '{0}' (expected stocks, options, currency or crypto)")]
pub struct AssetTypeParseError(pub String);

impl FromStr for AssetType {
    type Err = AssetTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        AssetType::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(key))
            .ok_or_else(|| AssetTypeParseError(s.to_string()))
    }
}

/// Brokerage parameters for one asset type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerRates {
    pub rate_buy: f64,
    pub rate_sell: f64,
    pub const_buy: f64,
    pub const_sell: f64,
    pub cap_buy: Option<f64>,
    pub cap_sell: Option<f64>,
}

/// Regulatory levies for one asset type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegulatoryRates {
    pub etc_rate: f64,
    pub sebi_rate: f64,
    pub stamp_duty_rate: f64,
    pub gst_rate: f64,
    pub stt_delivery: f64,
    pub stt_intraday: f64,
}

/// Fully merged rates for a (broker, asset) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectiveRates {
    pub broker: BrokerRates,
    pub regulatory: RegulatoryRates,
}

impl EffectiveRates {
    fn validate(&self, broker: &str) -> Result<(), ResolveError> {
        let b = &self.broker;
        let r = &self.regulatory;
        let named = [
            ("rate_buy", Some(b.rate_buy)),
            ("rate_sell", Some(b.rate_sell)),
            ("const_buy", Some(b.const_buy)),
            ("const_sell", Some(b.const_sell)),
            ("cap_buy", b.cap_buy),
            ("cap_sell", b.cap_sell),
            ("etc_rate", Some(r.etc_rate)),
            ("sebi_rate", Some(r.sebi_rate)),
            ("stamp_duty_rate", Some(r.stamp_duty_rate)),
            ("gst_rate", Some(r.gst_rate)),
            ("stt_delivery", Some(r.stt_delivery)),
            ("stt_intraday", Some(r.stt_intraday)),
        ];
        for (key, value) in named {
            if let Some(v) = value
                && !(v.is_finite() && v >= 0.0)
            {
                return Err(ResolveError::Malformed {
                    broker: broker.to_string(),
                    reason: format!("{key} must be a non-negative number, got {v}"),
                });
            }
        }
        Ok(())
    }
}

/// Raw fee schedule document, broker id → fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeSchedule {
    brokers: Map<String, Value>,
}

impl FeeSchedule {
    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn brokers(&self) -> impl Iterator<Item = &str> {
        self.brokers.keys().map(String::as_str)
    }

    fn asset_section(&self, broker: &str, asset: AssetType) -> Option<&Value> {
        self.brokers.get(broker)?.get(asset.as_str())
    }
}

/// Resolve the effective rates for `broker` trading `asset`.
pub fn resolve(
    schedule: &FeeSchedule,
    broker: &str,
    asset: AssetType,
) -> Result<EffectiveRates, ResolveError> {
    let mut merged_broker = merge_inheritance_chain(schedule, broker)?;

    let base_section = schedule
        .asset_section(BASE_BROKER, asset)
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    let broker_section = merged_broker
        .remove(asset.as_str())
        .unwrap_or_else(|| Value::Object(Map::new()));

    let effective = deep_merge(base_section, broker_section);

    if !has_section(&effective, "broker") && !has_section(&effective, "regulatory") {
        return Err(ResolveError::AssetNotConfigured {
            broker: broker.to_string(),
            asset: asset.as_str().to_string(),
        });
    }

    let rates: EffectiveRates =
        serde_json::from_value(effective).map_err(|e| ResolveError::Malformed {
            broker: broker.to_string(),
            reason: e.to_string(),
        })?;
    rates.validate(broker)?;
    Ok(rates)
}

/// Follow `inherits_from` from `broker` up to the root and shallow-merge the
/// fragments, root first, so each descendant's top-level keys win.
fn merge_inheritance_chain(
    schedule: &FeeSchedule,
    broker: &str,
) -> Result<Map<String, Value>, ResolveError> {
    let mut chain: Vec<(&str, &Map<String, Value>)> = Vec::new();
    let mut current: &str = broker;

    loop {
        if chain.iter().any(|(name, _)| *name == current) {
            return Err(ResolveError::InheritanceCycle {
                broker: current.to_string(),
            });
        }
        if chain.len() == MAX_INHERITANCE_DEPTH {
            return Err(ResolveError::InheritanceTooDeep {
                broker: broker.to_string(),
                max_depth: MAX_INHERITANCE_DEPTH,
            });
        }

        let fragment = match (schedule.brokers.get(current), chain.last()) {
            (Some(Value::Object(map)), _) => map,
            (Some(_), _) => {
                return Err(ResolveError::Malformed {
                    broker: current.to_string(),
                    reason: "broker entry must be an object".into(),
                });
            }
            (None, None) => {
                return Err(ResolveError::UnknownBroker {
                    broker: current.to_string(),
                });
            }
            (None, Some((child, _))) => {
                return Err(ResolveError::UnknownParent {
                    broker: child.to_string(),
                    parent: current.to_string(),
                });
            }
        };
        chain.push((current, fragment));

        match fragment.get(INHERITS_FROM) {
            None | Some(Value::Null) => break,
            Some(Value::String(parent)) => current = parent.as_str(),
            Some(_) => {
                return Err(ResolveError::Malformed {
                    broker: current.to_string(),
                    reason: format!("{INHERITS_FROM} must be a broker id string"),
                });
            }
        }
    }

    let mut merged = Map::new();
    for (_, fragment) in chain.iter().rev() {
        for (key, value) in fragment.iter() {
            if key != INHERITS_FROM {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(merged)
}

/// Recursively merge `overlay` onto `base`. Objects merge key by key; any
/// other overlay value replaces the base value.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

fn has_section(config: &Value, key: &str) -> bool {
    matches!(config.get(key), Some(Value::Object(map)) if !map.is_empty())
}
