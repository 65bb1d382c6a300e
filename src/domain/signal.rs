//! Per-bar trading signals produced by an upstream strategy.

use std::fmt;
use std::str::FromStr;

/// One discrete trading instruction per bar.
///
/// The simulator never generates signals; it only reacts to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    #[default]
    NoAction,
    BuyEntry,
    BuyExit,
    SellEntry,
    SellExit,
}

impl Signal {
    pub const ALL: [Signal; 5] = [
        Signal::NoAction,
        Signal::BuyEntry,
        Signal::BuyExit,
        Signal::SellEntry,
        Signal::SellExit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::NoAction => "NO_ACTION",
            Signal::BuyEntry => "BUY_ENTRY",
            Signal::BuyExit => "BUY_EXIT",
            Signal::SellEntry => "SELL_ENTRY",
            Signal::SellExit => "SELL_EXIT",
        }
    }

    /// Integer code emitted by the strategy layer: 1 buy, 2 buy close,
    /// -1 sell, -2 sell close, 0 nothing.
    pub fn from_code(code: i64) -> Option<Signal> {
        match code {
            0 => Some(Signal::NoAction),
            1 => Some(Signal::BuyEntry),
            2 => Some(Signal::BuyExit),
            -1 => Some(Signal::SellEntry),
            -2 => Some(Signal::SellExit),
            _ => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised signal '{0}'")]
pub struct SignalParseError(pub String);

impl FromStr for Signal {
    type Err = SignalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Signal::NoAction);
        }
        if let Ok(code) = trimmed.parse::<i64>() {
            return Signal::from_code(code).ok_or_else(|| SignalParseError(s.to_string()));
        }
        Signal::ALL
            .into_iter()
            .find(|sig| sig.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| SignalParseError(s.to_string()))
    }
}
