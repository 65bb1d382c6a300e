//! Core domain types and logic.

pub mod bar;
pub mod signal;
pub mod position;
pub mod portfolio;
pub mod fee_schedule;
pub mod commission;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
