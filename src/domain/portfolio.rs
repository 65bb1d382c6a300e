//! Account state and equity tracking.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

/// Cash and holdings of a single-asset account.
///
/// `shares` is signed: positive when long, negative when short. Cash may go
/// negative after covering a losing short.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub cash: f64,
    pub shares: f64,
    pub position: Position,
}

impl Account {
    pub fn new(initial_capital: f64) -> Self {
        Account {
            cash: initial_capital,
            shares: 0.0,
            position: Position::NotHeld,
        }
    }

    /// Mark-to-market value at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        match self.position {
            Position::Short => self.cash - self.shares.abs() * price,
            Position::Long | Position::NotHeld => self.cash + self.shares * price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_is_all_cash() {
        let account = Account::new(100_000.0);
        assert!((account.cash - 100_000.0).abs() < f64::EPSILON);
        assert_eq!(account.shares, 0.0);
        assert_eq!(account.position, Position::NotHeld);
        assert!((account.equity(123.0) - 100_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn long_equity_tracks_price() {
        let account = Account {
            cash: 0.0,
            shares: 10.0,
            position: Position::Long,
        };
        assert!((account.equity(110.0) - 1_100.0).abs() < 1e-9);
    }

    #[test]
    fn short_equity_subtracts_liability() {
        let account = Account {
            cash: 2_000.0,
            shares: -10.0,
            position: Position::Short,
        };
        assert!((account.equity(90.0) - 1_100.0).abs() < 1e-9);
        assert!((account.equity(120.0) - 800.0).abs() < 1e-9);
    }
}
