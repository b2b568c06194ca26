//! Configuration validation.
//!
//! Builds validated strategy and backtest settings from a [`ConfigPort`],
//! applying command-line overrides first. Nothing here touches price data.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::backtest::{BacktestConfig, DEFAULT_INITIAL_CAPITAL};
use crate::domain::error::ZrevertError;
use crate::domain::execution::{DEFAULT_COMMISSION, DEFAULT_MARGIN};
use crate::domain::strategy::{
    DEFAULT_ENTRY_Z, DEFAULT_EXIT_Z, DEFAULT_LOOKBACK, DEFAULT_POSITION_SIZE, StrategyParams,
};
use crate::ports::config_port::ConfigPort;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Values given on the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub code: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub output_dir: Option<PathBuf>,
}

/// Everything a backtest run needs, validated.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub data_dir: PathBuf,
    pub code: String,
    pub params: StrategyParams,
    pub backtest: BacktestConfig,
    pub output_dir: Option<PathBuf>,
}

pub fn build_run_settings(
    config: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<RunSettings, ZrevertError> {
    let data_dir = resolve_data_dir(config, overrides.data_dir.as_ref())?;
    let code = resolve_code(config, overrides.code.as_deref())?;
    let params = build_strategy_params(config)?;
    let backtest = build_backtest_config(config, overrides)?;
    let output_dir = overrides
        .output_dir
        .clone()
        .or_else(|| config.get_string("report", "output_dir").map(PathBuf::from));

    Ok(RunSettings {
        data_dir,
        code,
        params,
        backtest,
        output_dir,
    })
}

pub fn build_strategy_params(config: &dyn ConfigPort) -> Result<StrategyParams, ZrevertError> {
    let lookback = config.get_int("strategy", "lookback", DEFAULT_LOOKBACK as i64)?;
    let lookback = usize::try_from(lookback)
        .map_err(|_| ZrevertError::invalid("strategy", "lookback", "lookback must be >= 2"))?;

    let params = StrategyParams {
        lookback,
        entry_z: config.get_double("strategy", "entry_z", DEFAULT_ENTRY_Z)?,
        exit_z: config.get_double("strategy", "exit_z", DEFAULT_EXIT_Z)?,
        position_size: config.get_double("strategy", "position_size", DEFAULT_POSITION_SIZE)?,
    };
    params.validate()?;
    Ok(params)
}

pub fn build_backtest_config(
    config: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<BacktestConfig, ZrevertError> {
    let start_date = match overrides.start_date {
        Some(d) => d,
        None => parse_date(config, "start_date")?,
    };
    let end_date = match overrides.end_date {
        Some(d) => d,
        None => parse_date(config, "end_date")?,
    };

    let backtest = BacktestConfig {
        start_date,
        end_date,
        initial_capital: config.get_double(
            "backtest",
            "initial_capital",
            DEFAULT_INITIAL_CAPITAL,
        )?,
        commission: config.get_double("backtest", "commission", DEFAULT_COMMISSION)?,
        margin: config.get_double("backtest", "margin", DEFAULT_MARGIN)?,
        trade_on_close: config.get_bool("backtest", "trade_on_close", false)?,
        risk_free_rate: config.get_double("backtest", "risk_free_rate", 0.0)?,
    };
    backtest.validate()?;
    Ok(backtest)
}

pub fn resolve_code(config: &dyn ConfigPort, code: Option<&str>) -> Result<String, ZrevertError> {
    code.map(str::to_string)
        .or_else(|| config.get_string("data", "code"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ZrevertError::missing("data", "code"))
}

pub fn resolve_data_dir(
    config: &dyn ConfigPort,
    data_dir: Option<&PathBuf>,
) -> Result<PathBuf, ZrevertError> {
    data_dir
        .cloned()
        .or_else(|| config.get_string("data", "dir").map(PathBuf::from))
        .ok_or_else(|| ZrevertError::missing("data", "dir"))
}

fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, ZrevertError> {
    let value = config
        .get_string("data", key)
        .ok_or_else(|| ZrevertError::missing("data", key))?;
    NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|_| {
        ZrevertError::invalid(
            "data",
            key,
            format!("invalid {key} format '{value}', expected YYYY-MM-DD"),
        )
    })
}
