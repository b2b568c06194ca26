//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestResult};
use crate::domain::config_validation::{
    Overrides, RunSettings, build_run_settings, resolve_code, resolve_data_dir,
};
use crate::domain::error::ZrevertError;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::PriceSeries;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "zrevert", about = "Z-score mean-reversion backtester")]
pub struct Cli {
    /// Log progress (info level)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Log engine decisions (debug level)
    #[arg(long, global = true)]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding <CODE>.csv files
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        code: Option<String>,
        /// First date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Directory for trades, signals and equity CSV files
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file without loading data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for a code
    Info {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        code: Option<String>,
    },
    /// List codes available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

/// Install the stderr subscriber. `RUST_LOG` wins over the flags.
pub fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let default_level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (tests) keeps the first subscriber.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data_dir,
            code,
            start,
            end,
            output,
            dry_run,
        } => {
            let overrides = Overrides {
                data_dir,
                code,
                start_date: start,
                end_date: end,
                output_dir: output,
            };
            if dry_run {
                run_dry_run(&config, &overrides)
            } else {
                run_backtest(&config, &overrides)
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info {
            config,
            data_dir,
            code,
        } => run_info(config.as_ref(), data_dir, code.as_deref()),
        Command::ListSymbols { config, data_dir } => run_list_symbols(config.as_ref(), data_dir),
    }
}

fn fail(err: &ZrevertError) -> ExitCode {
    tracing::error!(%err, "command failed");
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

fn run_backtest(config_path: &Path, overrides: &Overrides) -> ExitCode {
    tracing::info!(config = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let settings = match build_run_settings(&adapter, overrides) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let data_port = CsvAdapter::new(settings.data_dir.clone());
    let (result, metrics) = match run_backtest_pipeline(&data_port, &settings) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    println!("{}", format_summary(&result, &metrics));

    if let Some(dir) = &settings.output_dir {
        if let Err(e) = CsvReportAdapter::new().write(&result, &metrics, dir) {
            return fail(&e);
        }
        eprintln!("\nReport written to: {}", dir.display());
    }
    ExitCode::SUCCESS
}

/// Fetch, simulate and score one code.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    settings: &RunSettings,
) -> Result<(BacktestResult, Metrics), ZrevertError> {
    let bt_config = &settings.backtest;
    let bars = data_port.fetch_ohlcv(&settings.code, bt_config.start_date, bt_config.end_date)?;
    if bars.is_empty() {
        return Err(ZrevertError::NoData {
            code: settings.code.clone(),
            start: bt_config.start_date.to_string(),
            end: bt_config.end_date.to_string(),
        });
    }
    let series = PriceSeries::new(settings.code.as_str(), bars)?;

    tracing::info!(
        code = %settings.code,
        bars = series.len(),
        strategy = %settings.params.describe(),
        "running backtest"
    );

    let result = backtest_engine::run_backtest(&series, &settings.params, bt_config)?;
    let metrics = Metrics::compute(&result, bt_config.risk_free_rate);
    Ok((result, metrics))
}

fn pct(value: f64) -> String {
    format!("{:.2}", value * 100.0)
}

/// Stats table printed after a run.
pub fn format_summary(result: &BacktestResult, metrics: &Metrics) -> String {
    let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
    let rows: Vec<(&str, String)> = vec![
        ("Code", result.code.clone()),
        ("Start", date(metrics.start)),
        ("End", date(metrics.end)),
        ("Duration", format!("{} days", metrics.duration_days)),
        ("Exposure Time [%]", pct(metrics.exposure_time)),
        ("Equity Final [$]", format!("{:.2}", metrics.equity_final)),
        ("Equity Peak [$]", format!("{:.2}", metrics.equity_peak)),
        ("Return [%]", pct(metrics.total_return)),
        ("Buy & Hold Return [%]", pct(metrics.buy_and_hold_return)),
        ("Return (Ann.) [%]", pct(metrics.annualized_return)),
        ("Volatility (Ann.) [%]", pct(metrics.annualized_volatility)),
        ("Sharpe Ratio", format!("{:.2}", metrics.sharpe_ratio)),
        ("Sortino Ratio", format!("{:.2}", metrics.sortino_ratio)),
        ("Max. Drawdown [%]", format!("-{}", pct(metrics.max_drawdown))),
        (
            "Max. Drawdown Duration",
            format!("{} bars", metrics.max_drawdown_duration),
        ),
        ("# Trades", metrics.total_trades.to_string()),
        ("Win Rate [%]", pct(metrics.win_rate)),
        ("Best Trade [%]", pct(metrics.best_trade)),
        ("Worst Trade [%]", pct(metrics.worst_trade)),
        ("Avg. Trade [%]", pct(metrics.avg_trade)),
        (
            "Max. Trade Duration",
            format!("{} days", metrics.max_trade_duration),
        ),
        (
            "Avg. Trade Duration",
            format!("{:.1} days", metrics.avg_trade_duration),
        ),
        ("Profit Factor", format!("{:.2}", metrics.profit_factor)),
        ("Expectancy [$]", format!("{:.2}", metrics.expectancy)),
        ("Strategy", result.params.describe()),
    ];

    rows.iter()
        .map(|(label, value)| format!("{label:<26}{value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn run_dry_run(config_path: &Path, overrides: &Overrides) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let settings = match build_run_settings(&adapter, overrides) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let bt = &settings.backtest;
    eprintln!("Config validated successfully");
    eprintln!("\nStrategy: {}", settings.params.describe());
    eprintln!("  position_size: {}", settings.params.position_size);
    eprintln!("\nData:");
    eprintln!("  dir:  {}", settings.data_dir.display());
    eprintln!("  code: {}", settings.code);
    eprintln!("  range: {} to {}", bt.start_date, bt.end_date);
    eprintln!("\nBacktest:");
    eprintln!("  initial_capital: {}", bt.initial_capital);
    eprintln!("  commission:      {}", bt.commission);
    eprintln!("  margin:          {}", bt.margin);
    eprintln!("  trade_on_close:  {}", bt.trade_on_close);
    match &settings.output_dir {
        Some(dir) => eprintln!("\nReport: {}", dir.display()),
        None => eprintln!("\nReport: stdout only"),
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match build_run_settings(&adapter, &Overrides::default()) {
        Ok(settings) => {
            eprintln!("  {}", settings.params.describe());
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

/// Data adapter from `--data-dir` or the config's `[data] dir`.
fn data_adapter(
    config: Option<&FileConfigAdapter>,
    data_dir: Option<PathBuf>,
) -> Result<CsvAdapter, ZrevertError> {
    let dir = match (data_dir, config) {
        (Some(dir), _) => dir,
        (None, Some(cfg)) => resolve_data_dir(cfg, None)?,
        (None, None) => return Err(ZrevertError::missing("data", "dir")),
    };
    Ok(CsvAdapter::new(dir))
}

fn load_optional_config(path: Option<&PathBuf>) -> Result<Option<FileConfigAdapter>, ExitCode> {
    path.map(|p| load_config(p)).transpose()
}

fn run_info(config_path: Option<&PathBuf>, data_dir: Option<PathBuf>, code: Option<&str>) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let adapter = match data_adapter(config.as_ref(), data_dir) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let code = match (code, config.as_ref()) {
        (Some(c), _) => c.to_string(),
        (None, Some(cfg)) => match resolve_code(cfg, None) {
            Ok(c) => c,
            Err(e) => return fail(&e),
        },
        (None, None) => return fail(&ZrevertError::missing("data", "code")),
    };

    match adapter.get_data_range(&code) {
        Ok(Some((min_date, max_date, count))) => {
            println!("{code}: {count} bars, {min_date} to {max_date}");
            ExitCode::SUCCESS
        }
        Ok(None) => fail(&ZrevertError::EmptySeries { code }),
        Err(e) => fail(&e),
    }
}

fn run_list_symbols(config_path: Option<&PathBuf>, data_dir: Option<PathBuf>) -> ExitCode {
    let config = match load_optional_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let adapter = match data_adapter(config.as_ref(), data_dir) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let symbols = match adapter.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{symbol}");
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
