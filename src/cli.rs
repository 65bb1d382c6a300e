//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_fee_adapter::load_fee_schedule;
use crate::adapters::text_report_adapter::{TextReportAdapter, render_summary};
use crate::domain::backtest::{BacktestConfig, Backtester};
use crate::domain::commission::{CommissionCalculator, FeeOutcome, TradeSide, parse_timestamp};
use crate::domain::config_validation::{require_string, validate_backtest_config};
use crate::domain::error::{ResolveError, SignalTraderError};
use crate::domain::fee_schedule::AssetType;
use crate::domain::metrics::PerformanceSummary;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Parser, Debug)]
#[command(
    name = "signaltrader",
    about = "Signal-driven backtester with Indian equity transaction fees"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest from a run configuration file
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Bar CSV file, overriding [data] bars
        #[arg(long)]
        bars: Option<PathBuf>,
        /// Fee schedule JSON, overriding [fees] schedule
        #[arg(long)]
        fees: Option<PathBuf>,
        /// Output directory, overriding [report] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the fee breakdown for a single transaction
    Fees {
        #[arg(long)]
        fees: PathBuf,
        #[arg(long)]
        broker: String,
        #[arg(long)]
        principal: f64,
        #[arg(long)]
        side: TradeSide,
        #[arg(long, default_value = "stocks")]
        asset: AssetType,
        /// Entry timestamp (ISO-8601)
        #[arg(long)]
        entry: Option<String>,
        /// Exit timestamp (ISO-8601)
        #[arg(long)]
        exit: Option<String>,
    },
    /// Resolve every broker and asset type in a fee schedule
    CheckFees {
        #[arg(long)]
        fees: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            bars,
            fees,
            output,
        } => run_backtest(&config, bars.as_deref(), fees.as_deref(), output.as_deref()),
        Command::Fees {
            fees,
            broker,
            principal,
            side,
            asset,
            entry,
            exit,
        } => run_fees(
            &fees,
            &broker,
            principal,
            side,
            asset,
            entry.as_deref(),
            exit.as_deref(),
        ),
        Command::CheckFees { fees } => run_check_fees(&fees),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SignalTraderError> {
    FileConfigAdapter::from_file(path).map_err(|e| SignalTraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Validate the `[backtest]` section and build the simulator configuration.
pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, SignalTraderError> {
    validate_backtest_config(adapter)?;

    let asset_type = adapter
        .get_string("backtest", "asset_type")
        .map(|s| s.parse::<AssetType>())
        .transpose()
        .map_err(|e| SignalTraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "asset_type".into(),
            reason: e.to_string(),
        })?
        .unwrap_or(AssetType::Stocks);

    Ok(BacktestConfig {
        initial_capital: adapter.get_double("backtest", "initial_capital", 0.0),
        broker: require_string(adapter, "backtest", "broker")?,
        asset_type,
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", 0.0),
    })
}

fn path_setting(
    adapter: &dyn ConfigPort,
    override_path: Option<&Path>,
    section: &str,
    key: &str,
) -> Result<PathBuf, SignalTraderError> {
    match override_path {
        Some(p) => Ok(p.to_path_buf()),
        None => require_string(adapter, section, key).map(PathBuf::from),
    }
}

pub fn run_backtest(
    config_path: &Path,
    bars_override: Option<&Path>,
    fees_override: Option<&Path>,
    output_override: Option<&Path>,
) -> Result<(), SignalTraderError> {
    info!("loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    let bt_config = build_backtest_config(&adapter)?;
    let ticker = require_string(&adapter, "backtest", "ticker")?;

    let bars_path = path_setting(&adapter, bars_override, "data", "bars")?;
    let fees_path = path_setting(&adapter, fees_override, "fees", "schedule")?;
    let output_dir = match output_override {
        Some(p) => p.to_path_buf(),
        None => adapter
            .get_string("report", "output_dir")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR), PathBuf::from),
    };

    info!("loading fee schedule from {}", fees_path.display());
    let calculator = CommissionCalculator::new(load_fee_schedule(&fees_path)?);
    if let Err(e) = calculator.rates(&bt_config.broker, bt_config.asset_type) {
        warn!(error = %e, "fees for the configured broker cannot be resolved, trades will use zero fees");
    }
    let fees = calculator.for_broker(&bt_config.broker, bt_config.asset_type);

    info!("loading bars from {}", bars_path.display());
    let series = CsvAdapter::new(bars_path).fetch_bars()?;

    let result = Backtester::from_config(&bt_config, &fees).run_series(&series)?;
    let summary = PerformanceSummary::compute(&result, bt_config.risk_free_rate);

    print!("{}", render_summary(&ticker, &summary));

    let report = TextReportAdapter::new(output_dir);
    for path in report.write(&ticker, &summary, &result.completed_trades())? {
        info!("wrote {}", path.display());
    }
    Ok(())
}

pub fn run_fees(
    fees_path: &Path,
    broker: &str,
    principal: f64,
    side: TradeSide,
    asset: AssetType,
    entry: Option<&str>,
    exit: Option<&str>,
) -> Result<(), SignalTraderError> {
    let calculator = CommissionCalculator::new(load_fee_schedule(fees_path)?);

    let parse = |label: &str, value: Option<&str>| {
        value.and_then(|s| {
            let parsed = parse_timestamp(s);
            if parsed.is_none() {
                warn!("unparseable {label} timestamp '{s}', holding type will be UNKNOWN");
            }
            parsed
        })
    };
    let entry = parse("entry", entry);
    let exit = parse("exit", exit);

    match calculator.calculate(broker, principal, side, asset, entry, exit)? {
        FeeOutcome::Computed(breakdown) => {
            println!("--- {broker} {side} trade of ₹{principal:.2} ---");
            for (label, value) in breakdown.rows() {
                println!("{label}: {value}");
            }
        }
        FeeOutcome::NotImplemented { asset } => {
            println!("Fee calculation for asset type '{asset}' is not implemented yet.");
        }
    }
    Ok(())
}

pub fn run_check_fees(fees_path: &Path) -> Result<(), SignalTraderError> {
    let calculator = CommissionCalculator::new(load_fee_schedule(fees_path)?);

    let mut resolved = 0usize;
    let mut unconfigured = 0usize;
    let mut failed = 0usize;

    for (broker, asset, outcome) in calculator.resolution_report() {
        match outcome {
            Ok(_) => {
                resolved += 1;
                println!("ok      {broker}/{asset}");
            }
            Err(ResolveError::AssetNotConfigured { .. }) => unconfigured += 1,
            Err(e) => {
                println!("FAILED  {broker}/{asset}: {e}");
                failed += 1;
            }
        }
    }
    println!("{resolved} resolved, {unconfigured} not configured, {failed} failed");

    if failed == 0 {
        Ok(())
    } else {
        Err(SignalTraderError::FeeSchedule {
            file: fees_path.display().to_string(),
            reason: format!("{failed} broker/asset pairs failed to resolve"),
        })
    }
}
