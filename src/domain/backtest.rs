//! Signal-driven position simulator.
//!
//! The account moves between [`Position`] states on each bar's [`Signal`],
//! paying fees from a [`FeePort`] on every fill. Equity is marked after the
//! bar's transition at that bar's close. Bar 0 only seeds the series.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use super::bar::{BarSeries, PriceBar};
use super::commission::{FeeOutcome, TradeSide};
use super::error::SignalTraderError;
use super::fee_schedule::AssetType;
use super::portfolio::{Account, EquityPoint};
use super::position::{CompletedTrade, Direction, Position, TradeExit, TradeRecord, completed_trades};
use super::signal::Signal;
use crate::ports::fee_port::FeePort;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub broker: String,
    pub asset_type: AssetType,
    /// Annual rate, used for the Sharpe ratio.
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100_000.0,
            broker: "base".to_string(),
            asset_type: AssetType::Stocks,
            risk_free_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub initial_capital: f64,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
    pub final_position: Position,
}

impl BacktestResult {
    /// Last recorded equity, or the initial capital if nothing was recorded.
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map_or(self.initial_capital, |p| p.equity)
    }

    pub fn completed_trades(&self) -> Vec<CompletedTrade> {
        completed_trades(&self.trades)
    }

    pub fn has_open_position(&self) -> bool {
        self.trades.last().is_some_and(TradeRecord::is_open)
    }
}

pub struct Backtester<'a> {
    initial_capital: f64,
    fees: &'a dyn FeePort,
}

impl<'a> Backtester<'a> {
    pub fn new(initial_capital: f64, fees: &'a dyn FeePort) -> Self {
        Backtester {
            initial_capital,
            fees,
        }
    }

    pub fn from_config(config: &BacktestConfig, fees: &'a dyn FeePort) -> Self {
        Backtester::new(config.initial_capital, fees)
    }

    pub fn run_series(&self, series: &BarSeries) -> Result<BacktestResult, SignalTraderError> {
        self.run(series.bars(), series.signals())
    }

    /// Simulate `signals` over `bars`. Both series are index aligned; each run
    /// starts from a fresh account.
    pub fn run(
        &self,
        bars: &[PriceBar],
        signals: &[Signal],
    ) -> Result<BacktestResult, SignalTraderError> {
        if bars.len() != signals.len() {
            return Err(SignalTraderError::SeriesLengthMismatch {
                prices: bars.len(),
                signals: signals.len(),
            });
        }

        info!(bars = bars.len(), capital = self.initial_capital, "running backtest");

        let mut account = Account::new(self.initial_capital);
        let mut trades: Vec<TradeRecord> = Vec::new();
        let mut equity_curve = Vec::with_capacity(bars.len().saturating_sub(1));

        for (bar, &signal) in bars.iter().zip(signals).skip(1) {
            self.step(&mut account, &mut trades, bar, signal);

            let equity = account.equity(bar.close);
            if equity.is_nan() {
                debug!(timestamp = %bar.timestamp, "dropping NaN equity");
                continue;
            }
            equity_curve.push(EquityPoint {
                timestamp: bar.timestamp,
                equity,
            });
        }

        let result = BacktestResult {
            initial_capital: self.initial_capital,
            equity_curve,
            trades,
            final_position: account.position,
        };
        info!(
            trades = result.trades.len(),
            final_equity = result.final_equity(),
            "backtest finished"
        );
        Ok(result)
    }

    fn step(
        &self,
        account: &mut Account,
        trades: &mut Vec<TradeRecord>,
        bar: &PriceBar,
        signal: Signal,
    ) {
        match (account.position, signal) {
            (Position::NotHeld, Signal::BuyEntry) => self.enter_long(account, trades, bar),
            (Position::NotHeld, Signal::SellEntry) => self.enter_short(account, trades, bar),
            (Position::Long, Signal::BuyExit) => self.exit_long(account, trades, bar),
            (Position::Short, Signal::SellExit) => self.cover_short(account, trades, bar),
            (Position::NotHeld, Signal::NoAction)
            | (Position::Long, Signal::NoAction)
            | (Position::Short, Signal::NoAction) => {}
            (Position::NotHeld, Signal::BuyExit | Signal::SellExit)
            | (Position::Long, Signal::BuyEntry | Signal::SellEntry | Signal::SellExit)
            | (Position::Short, Signal::BuyEntry | Signal::BuyExit | Signal::SellEntry) => {
                debug!(
                    timestamp = %bar.timestamp,
                    position = ?account.position,
                    %signal,
                    "signal ignored in current position"
                );
            }
        }
    }

    fn enter_long(&self, account: &mut Account, trades: &mut Vec<TradeRecord>, bar: &PriceBar) {
        let price = bar.close;
        let principal = account.cash;
        if !tradable_price(price) || !(principal.is_finite() && principal > 0.0) {
            debug!(timestamp = %bar.timestamp, price, principal, "long entry abandoned");
            return;
        }

        let fee = self.fee(principal, TradeSide::Buy, Some(bar.timestamp), None);
        let invested = principal - fee;
        if invested <= 0.0 {
            debug!(timestamp = %bar.timestamp, fee, "fee consumes principal, long entry abandoned");
            return;
        }

        let shares = invested / price;
        account.shares = shares;
        account.cash = 0.0;
        account.position = Position::Long;
        trades.push(TradeRecord::open(
            bar.timestamp,
            price,
            Direction::Long,
            shares,
            fee,
        ));
        debug!(timestamp = %bar.timestamp, price, shares, fee, "entered long");
    }

    fn enter_short(&self, account: &mut Account, trades: &mut Vec<TradeRecord>, bar: &PriceBar) {
        let price = bar.close;
        if !tradable_price(price) {
            debug!(timestamp = %bar.timestamp, price, "short entry abandoned");
            return;
        }
        let shares = account.cash / price;
        let principal = shares * price;
        if !(principal.is_finite() && principal > 0.0) {
            debug!(timestamp = %bar.timestamp, principal, "short entry abandoned");
            return;
        }

        let fee = self.fee(principal, TradeSide::Sell, None, Some(bar.timestamp));
        account.cash += principal - fee;
        account.shares = -shares;
        account.position = Position::Short;
        trades.push(TradeRecord::open(
            bar.timestamp,
            price,
            Direction::Short,
            shares,
            fee,
        ));
        debug!(timestamp = %bar.timestamp, price, shares, fee, "entered short");
    }

    fn exit_long(&self, account: &mut Account, trades: &mut [TradeRecord], bar: &PriceBar) {
        let Some(record) = trades.last_mut().filter(|r| r.is_open()) else {
            debug!(timestamp = %bar.timestamp, "no open trade to exit");
            return;
        };
        let price = bar.close;
        if !price.is_finite() {
            warn!(timestamp = %bar.timestamp, price, "cannot exit long at this price, holding");
            return;
        }

        let principal = account.shares * price;
        let fee = self.fee(
            principal,
            TradeSide::Sell,
            Some(record.entry_timestamp),
            Some(bar.timestamp),
        );
        account.cash += principal - fee;
        account.shares = 0.0;
        account.position = Position::NotHeld;
        record.close(TradeExit {
            timestamp: bar.timestamp,
            price,
            fee,
        });
        debug!(timestamp = %bar.timestamp, price, fee, "exited long");
    }

    fn cover_short(&self, account: &mut Account, trades: &mut [TradeRecord], bar: &PriceBar) {
        let Some(record) = trades.last_mut().filter(|r| r.is_open()) else {
            debug!(timestamp = %bar.timestamp, "no open trade to cover");
            return;
        };
        let price = bar.close;
        if !price.is_finite() {
            warn!(timestamp = %bar.timestamp, price, "cannot cover short at this price, holding");
            return;
        }

        let principal = account.shares.abs() * price;
        let fee = self.fee(
            principal,
            TradeSide::Buy,
            Some(record.entry_timestamp),
            Some(bar.timestamp),
        );
        account.cash -= principal + fee;
        account.shares = 0.0;
        account.position = Position::NotHeld;
        record.close(TradeExit {
            timestamp: bar.timestamp,
            price,
            fee,
        });
        debug!(timestamp = %bar.timestamp, price, fee, "covered short");
    }

    /// Total fee for a fill. Errors and unpriced asset types fall back to zero.
    fn fee(
        &self,
        principal: f64,
        side: TradeSide,
        entry: Option<NaiveDateTime>,
        exit: Option<NaiveDateTime>,
    ) -> f64 {
        match self.fees.transaction_fee(principal, side, entry, exit) {
            Ok(FeeOutcome::Computed(breakdown)) => breakdown.total,
            Ok(FeeOutcome::NotImplemented { asset }) => {
                warn!(%asset, %side, "fees not implemented for asset type, using zero fee");
                0.0
            }
            Err(e) => {
                warn!(error = %e, %side, principal, "fee calculation failed, using zero fee");
                0.0
            }
        }
    }
}

fn tradable_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}
