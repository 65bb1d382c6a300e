//! Market position state and trade records.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// Current market exposure of the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Position {
    #[default]
    NotHeld,
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.write_str("Long"),
            Direction::Short => f.write_str("Short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeExit {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub fee: f64,
}

/// A trade opened on entry and closed at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub direction: Direction,
    /// Always positive, regardless of direction.
    pub shares: f64,
    pub entry_fee: f64,
    exit: Option<TradeExit>,
}

impl TradeRecord {
    pub fn open(
        entry_timestamp: NaiveDateTime,
        entry_price: f64,
        direction: Direction,
        shares: f64,
        entry_fee: f64,
    ) -> Self {
        TradeRecord {
            entry_timestamp,
            entry_price,
            direction,
            shares: shares.abs(),
            entry_fee,
            exit: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.exit.is_none()
    }

    pub fn exit(&self) -> Option<&TradeExit> {
        self.exit.as_ref()
    }

    /// Record the exit. Returns `false` and leaves the record untouched if it
    /// was already closed.
    pub fn close(&mut self, exit: TradeExit) -> bool {
        if self.exit.is_some() {
            return false;
        }
        self.exit = Some(exit);
        true
    }

    pub fn completed(&self) -> Option<CompletedTrade> {
        self.exit.map(|exit| CompletedTrade::new(self, exit))
    }
}

/// One row of the trade ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedTrade {
    pub entry_timestamp: NaiveDateTime,
    pub exit_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub direction: Direction,
    pub shares: f64,
    pub entry_fee: f64,
    pub exit_fee: f64,
    pub gross_pnl: f64,
    pub total_fees: f64,
    pub net_pnl: f64,
}

impl CompletedTrade {
    fn new(record: &TradeRecord, exit: TradeExit) -> Self {
        let shares = record.shares.abs();
        let gross_pnl = match record.direction {
            Direction::Long => (exit.price - record.entry_price) * shares,
            Direction::Short => (record.entry_price - exit.price) * shares,
        };
        let total_fees = record.entry_fee + exit.fee;
        CompletedTrade {
            entry_timestamp: record.entry_timestamp,
            exit_timestamp: exit.timestamp,
            entry_price: record.entry_price,
            exit_price: exit.price,
            direction: record.direction,
            shares,
            entry_fee: record.entry_fee,
            exit_fee: exit.fee,
            gross_pnl,
            total_fees,
            net_pnl: gross_pnl - total_fees,
        }
    }

    pub fn is_win(&self) -> bool {
        self.net_pnl > 0.0
    }
}

/// Completed trades in entry order; open records are skipped.
pub fn completed_trades(records: &[TradeRecord]) -> Vec<CompletedTrade> {
    records.iter().filter_map(TradeRecord::completed).collect()
}
