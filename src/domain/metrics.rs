//! Performance metrics over a finished backtest.

use super::backtest::BacktestResult;
use super::portfolio::EquityPoint;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub initial_capital: f64,
    pub final_equity: f64,
    pub total_net_pnl: f64,
    pub total_return_pct: f64,
    pub sharpe_ratio: f64,
    /// Non-positive; -25.0 means a 25% peak-to-trough decline.
    pub max_drawdown_pct: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_pct: f64,
    pub avg_win: f64,
    /// Mean net P/L of losing trades, normally negative.
    pub avg_loss: f64,
    pub open_position: bool,
}

impl PerformanceSummary {
    /// Summarise `result`. `risk_free_rate` is annual.
    pub fn compute(result: &BacktestResult, risk_free_rate: f64) -> Self {
        let initial_capital = result.initial_capital;
        let final_equity = result.final_equity();
        let total_net_pnl = final_equity - initial_capital;
        let total_return_pct = if initial_capital > 0.0 {
            total_net_pnl / initial_capital * 100.0
        } else {
            0.0
        };

        let trades = result.completed_trades();
        let (wins, losses): (Vec<_>, Vec<_>) = trades.iter().partition(|t| t.is_win());
        let wins: Vec<f64> = wins.iter().map(|t| t.net_pnl).collect();
        let losses: Vec<f64> = losses.iter().map(|t| t.net_pnl).collect();

        let total_trades = trades.len();
        let win_rate_pct = if total_trades > 0 {
            wins.len() as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        PerformanceSummary {
            initial_capital,
            final_equity,
            total_net_pnl,
            total_return_pct,
            sharpe_ratio: sharpe_ratio(&result.equity_curve, risk_free_rate),
            max_drawdown_pct: max_drawdown_pct(&result.equity_curve),
            total_trades,
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate_pct,
            avg_win: mean(&wins).unwrap_or(0.0),
            avg_loss: mean(&losses).unwrap_or(0.0),
            open_position: result.has_open_position(),
        }
    }

    /// Labelled, display-formatted summary values.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Initial Capital", format_currency(self.initial_capital)),
            ("Final Equity", format_currency(self.final_equity)),
            ("Total Net P/L", format_currency(self.total_net_pnl)),
            ("Total Return (%)", format!("{:.2}%", self.total_return_pct)),
            ("Sharpe Ratio", format!("{:.2}", self.sharpe_ratio)),
            ("Max Drawdown (%)", format!("{:.2}%", self.max_drawdown_pct)),
            ("Number of Trades", self.total_trades.to_string()),
            ("Winning Trades", self.winning_trades.to_string()),
            ("Losing Trades", self.losing_trades.to_string()),
            ("Win Rate (%)", format!("{:.2}%", self.win_rate_pct)),
            ("Average Winning Trade", format_currency(self.avg_win)),
            ("Average Losing Trade", format_currency(self.avg_loss)),
        ]
    }
}

/// Largest percentage decline from a running peak. Points before the first
/// positive peak are skipped.
pub fn max_drawdown_pct(equity_curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for point in equity_curve {
        peak = peak.max(point.equity);
        if peak > 0.0 {
            let dd = (point.equity - peak) / peak * 100.0;
            if dd < worst {
                worst = dd;
            }
        }
    }
    worst
}

/// Annualised Sharpe ratio of per-bar percentage changes, using the sample
/// standard deviation. Zero when fewer than two returns exist or the returns
/// do not vary.
pub fn sharpe_ratio(equity_curve: &[EquityPoint], risk_free_rate: f64) -> f64 {
    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| (w[1].equity - w[0].equity) / w[0].equity)
        .filter(|r| r.is_finite())
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();
    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }

    let per_bar_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    (mean - per_bar_rf) / std_dev * TRADING_DAYS_PER_YEAR.sqrt()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Two decimal places with comma thousands separators, e.g. `-1,234.50`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return format!("{value:.2}");
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value.is_sign_negative() { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{Direction, TradeExit, TradeRecord};
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    fn ts(i: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + TimeDelta::days(i)
    }

    fn curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &equity)| EquityPoint {
                timestamp: ts(i as i64),
                equity,
            })
            .collect()
    }

    fn closed(entry: f64, exit: f64) -> TradeRecord {
        let mut record = TradeRecord::open(ts(0), entry, Direction::Long, 1.0, 0.0);
        record.close(TradeExit {
            timestamp: ts(1),
            price: exit,
            fee: 0.0,
        });
        record
    }

    #[test]
    fn drawdown_from_peak() {
        assert_relative_eq!(max_drawdown_pct(&curve(&[100.0, 120.0, 90.0, 110.0])), -25.0);
    }

    #[test]
    fn drawdown_empty_and_rising() {
        assert_eq!(max_drawdown_pct(&[]), 0.0);
        assert_eq!(max_drawdown_pct(&curve(&[1.0, 2.0, 3.0])), 0.0);
    }

    #[test]
    fn flat_curve_has_zero_sharpe() {
        assert_eq!(sharpe_ratio(&curve(&[100.0; 10]), 0.0), 0.0);
        assert_eq!(sharpe_ratio(&curve(&[100.0; 10]), 0.05), 0.0);
    }

    #[test]
    fn sharpe_needs_two_returns() {
        assert_eq!(sharpe_ratio(&curve(&[100.0, 110.0]), 0.0), 0.0);
    }

    #[test]
    fn sharpe_uses_sample_std_dev() {
        // Returns: +10%, -10%, +10%.
        let c = curve(&[100.0, 110.0, 99.0, 108.9]);
        let returns = [0.1, -0.1, 0.1];
        let mean = returns.iter().sum::<f64>() / 3.0;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 2.0;
        let expected = mean / var.sqrt() * 252f64.sqrt();
        assert_relative_eq!(sharpe_ratio(&c, 0.0), expected, epsilon = 1e-9);
    }

    #[test]
    fn sharpe_subtracts_daily_risk_free_rate() {
        let c = curve(&[100.0, 110.0, 99.0, 108.9]);
        let returns = [0.1, -0.1, 0.1];
        let mean = returns.iter().sum::<f64>() / 3.0;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 2.0;
        let expected = (mean - 0.05 / 252.0) / var.sqrt() * 252f64.sqrt();

        let with_rf = sharpe_ratio(&c, 0.05);
        assert_relative_eq!(with_rf, expected, epsilon = 1e-9);
        assert!(with_rf < sharpe_ratio(&c, 0.0));
    }

    #[test]
    fn zero_equity_returns_are_skipped() {
        let with_zero = curve(&[0.0, 100.0, 110.0, 99.0]);
        let without = curve(&[100.0, 110.0, 99.0]);
        assert_relative_eq!(
            sharpe_ratio(&with_zero, 0.0),
            sharpe_ratio(&without, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(100_000.0), "100,000.00");
        assert_eq!(format_currency(1_234_567.891), "1,234,567.89");
        assert_eq!(format_currency(-9_876.5), "-9,876.50");
        assert_eq!(format_currency(999.999), "1,000.00");
        assert_eq!(format_currency(0.0), "0.00");
    }

    #[test]
    fn summary_counts_zero_pnl_as_loss() {
        let result = BacktestResult {
            initial_capital: 1_000.0,
            equity_curve: curve(&[1_000.0, 1_010.0, 1_010.0, 1_005.0]),
            trades: vec![closed(100.0, 110.0), closed(100.0, 100.0), closed(100.0, 95.0)],
            final_position: crate::domain::position::Position::NotHeld,
        };
        let summary = PerformanceSummary::compute(&result, 0.0);

        assert_eq!(summary.total_trades, 3);
        assert_eq!(summary.winning_trades, 1);
        assert_eq!(summary.losing_trades, 2);
        assert_relative_eq!(summary.win_rate_pct, 100.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(summary.avg_win, 10.0);
        assert_relative_eq!(summary.avg_loss, -2.5);
        assert_relative_eq!(summary.total_net_pnl, 5.0);
        assert_relative_eq!(summary.total_return_pct, 0.5);
        assert!(!summary.open_position);
    }

    #[test]
    fn empty_result_summary() {
        let result = BacktestResult {
            initial_capital: 50_000.0,
            equity_curve: Vec::new(),
            trades: Vec::new(),
            final_position: crate::domain::position::Position::NotHeld,
        };
        let summary = PerformanceSummary::compute(&result, 0.0);
        assert_eq!(summary.final_equity, 50_000.0);
        assert_eq!(summary.total_trades, 0);
        assert_eq!(summary.win_rate_pct, 0.0);
        assert_eq!(summary.avg_win, 0.0);
        assert_eq!(summary.avg_loss, 0.0);
        assert_eq!(summary.max_drawdown_pct, 0.0);

        let rows = summary.rows();
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0], ("Initial Capital", "50,000.00".to_string()));
        assert_eq!(rows[3], ("Total Return (%)", "0.00%".to_string()));
        assert_eq!(rows[6], ("Number of Trades", "0".to_string()));
    }
}
