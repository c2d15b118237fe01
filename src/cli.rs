//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::console_report_adapter::ConsoleReportAdapter;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::equity_csv_adapter::EquityCsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    build_backtest_config, build_strategies, data_file, BACKTEST_SECTION,
};
use crate::domain::error::BacktestError;
use crate::domain::metrics::Frequency;
use crate::domain::strategy::Strategy;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "barsim", about = "Single-instrument bar-by-bar backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every configured strategy over a bar series
    Backtest(BacktestArgs),
    /// Check a configuration file without running it
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(clap::Args, Debug, Default, Clone)]
pub struct BacktestArgs {
    /// Bar series CSV; overrides [backtest] data_file
    #[arg(short, long)]
    pub data: Option<PathBuf>,
    /// INI file with [backtest] and strategy sections
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Starting cash; overrides [backtest] starting_cash
    #[arg(long)]
    pub cash: Option<f64>,
    /// hourly, daily, weekly, monthly or periods per year
    #[arg(long)]
    pub frequency: Option<Frequency>,
    /// Annual risk-free rate in [0, 1)
    #[arg(long)]
    pub risk_free_rate: Option<f64>,
    /// Write <strategy>_equity.csv files into this directory
    #[arg(long)]
    pub equity_dir: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest(args) => run_backtest(&args),
        Command::Validate { config } => run_validate(&config),
    }
}

fn exit_with(err: BacktestError) -> ExitCode {
    log::error!("{err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, BacktestError> {
    FileConfigAdapter::from_file(path).map_err(|e| BacktestError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// `[backtest]` values with command-line overrides applied, validated.
pub fn resolve_backtest_config(
    config: &FileConfigAdapter,
    args: &BacktestArgs,
) -> Result<BacktestConfig, BacktestError> {
    let mut bt = build_backtest_config(config)?;
    if let Some(cash) = args.cash {
        bt.starting_cash = cash;
    }
    if let Some(frequency) = args.frequency {
        bt.frequency = frequency;
    }
    if let Some(rate) = args.risk_free_rate {
        bt.risk_free_rate = rate;
    }
    bt.validate()?;
    Ok(bt)
}

/// `--data` wins over `[backtest] data_file`.
pub fn resolve_data_path(
    config: &FileConfigAdapter,
    args: &BacktestArgs,
) -> Result<PathBuf, BacktestError> {
    args.data
        .clone()
        .or_else(|| data_file(config))
        .ok_or_else(|| BacktestError::ConfigMissing {
            section: BACKTEST_SECTION.to_string(),
            key: "data_file".to_string(),
        })
}

fn run_backtest(args: &BacktestArgs) -> ExitCode {
    let stdout = io::stdout();
    match backtest(args, &mut stdout.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => exit_with(e),
    }
}

/// Resolve configuration, load the series, run and report.
///
/// Reports go to `out`; progress is logged.
pub fn backtest(
    args: &BacktestArgs,
    out: &mut dyn Write,
) -> Result<Vec<BacktestResult>, BacktestError> {
    // Stage 1: Load config
    let config = match &args.config {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            load_config(path)?
        }
        None => FileConfigAdapter::empty(),
    };

    // Stage 2: Validate and build
    let bt_config = resolve_backtest_config(&config, args)?;
    let strategies = build_strategies(&config)?;
    let data_path = resolve_data_path(&config, args)?;

    // Stages 3-5: Data port dependent pipeline
    let data_port = CsvAdapter::new(data_path);
    run_backtest_pipeline(
        &data_port,
        &strategies,
        &bt_config,
        out,
        args.equity_dir.as_deref(),
    )
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategies: &[Strategy],
    bt_config: &BacktestConfig,
    out: &mut dyn Write,
    equity_dir: Option<&Path>,
) -> Result<Vec<BacktestResult>, BacktestError> {
    // Stage 3: Load bars
    log::info!("Loading bars from {}", data_port.source_name());
    let bars = data_port.fetch_bars()?;
    if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
        log::info!("Loaded {} bars, {} to {}", bars.len(), first.date, last.date);
    }

    // Stage 4: Run
    log::info!(
        "Running {} strategies, starting cash {:.2}, {} sampling",
        strategies.len(),
        bt_config.starting_cash,
        bt_config.frequency
    );
    let results = backtest_engine::run_many(&bars, strategies, bt_config)?;

    // Stage 5: Report
    ConsoleReportAdapter::new(out).write_all(&results)?;
    if let Some(dir) = equity_dir {
        EquityCsvAdapter::new(dir.to_path_buf()).write_all(&results)?;
    }

    Ok(results)
}

fn run_validate(config_path: &Path) -> ExitCode {
    let stdout = io::stdout();
    match validate(config_path, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => exit_with(e),
    }
}

/// Check a configuration file and print what it would run.
pub fn validate(config_path: &Path, out: &mut dyn Write) -> Result<(), BacktestError> {
    log::info!("Validating {}", config_path.display());
    let config = load_config(config_path)?;
    let bt_config = build_backtest_config(&config)?;
    let strategies = build_strategies(&config)?;

    writeln!(out, "Configuration OK")?;
    writeln!(out, "  starting cash:  {:.2}", bt_config.starting_cash)?;
    writeln!(out, "  frequency:      {}", bt_config.frequency)?;
    writeln!(out, "  risk-free rate: {}", bt_config.risk_free_rate)?;
    if let Some(path) = data_file(&config) {
        writeln!(out, "  data file:      {}", path.display())?;
    }
    for strategy in &strategies {
        writeln!(out, "  strategy:       {} [{}]", strategy.name, strategy.rule)?;
    }
    Ok(())
}
