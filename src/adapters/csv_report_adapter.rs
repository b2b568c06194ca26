//! CSV report adapter.
//!
//! Writes three files into the output directory:
//! - `trades.csv`: one row per closed trade
//! - `signals.csv`: close, rolling stats, z-score, bands, state and action per bar
//! - `equity.csv`: equity at each bar's close

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::ZrevertError;
use crate::domain::metrics::Metrics;
use crate::ports::report_port::ReportPort;

pub const TRADES_FILE: &str = "trades.csv";
pub const SIGNALS_FILE: &str = "signals.csv";
pub const EQUITY_FILE: &str = "equity.csv";

#[derive(Serialize)]
struct SignalRow {
    date: NaiveDate,
    close: f64,
    mean: Option<f64>,
    std: Option<f64>,
    z: Option<f64>,
    upper_band: Option<f64>,
    lower_band: Option<f64>,
    state: String,
    action: String,
}

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_trades(result: &BacktestResult, path: &Path) -> Result<(), ZrevertError> {
        let mut wtr = csv::Writer::from_path(path)?;
        for trade in &result.portfolio.closed_trades {
            wtr.serialize(trade)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_signals(result: &BacktestResult, path: &Path) -> Result<(), ZrevertError> {
        let mut wtr = csv::Writer::from_path(path)?;
        for (point, step) in result.signals.points.iter().zip(&result.steps) {
            wtr.serialize(SignalRow {
                date: point.date,
                close: point.close,
                mean: point.mean(),
                std: point.std_dev(),
                z: point.z,
                upper_band: point.upper_band(),
                lower_band: point.lower_band(),
                state: step.state.to_string(),
                action: step.transition.to_string(),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_equity(result: &BacktestResult, path: &Path) -> Result<(), ZrevertError> {
        let mut wtr = csv::Writer::from_path(path)?;
        for point in &result.portfolio.equity_curve {
            wtr.serialize(point)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        metrics: &Metrics,
        output_dir: &Path,
    ) -> Result<(), ZrevertError> {
        fs::create_dir_all(output_dir).map_err(|e| ZrevertError::Report {
            reason: format!("cannot create {}: {e}", output_dir.display()),
        })?;

        Self::write_trades(result, &output_dir.join(TRADES_FILE))?;
        Self::write_signals(result, &output_dir.join(SIGNALS_FILE))?;
        Self::write_equity(result, &output_dir.join(EQUITY_FILE))?;

        tracing::info!(
            dir = %output_dir.display(),
            trades = metrics.total_trades,
            bars = result.steps.len(),
            "report written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{BacktestConfig, run_backtest};
    use crate::domain::ohlcv::{OhlcvBar, PriceSeries};
    use crate::domain::strategy::StrategyParams;
    use tempfile::TempDir;

    fn result() -> BacktestResult {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let mut closes = vec![100.0; 25];
        closes.extend([70.0; 5]);
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
            })
            .collect();
        let series = PriceSeries::new("TEST", bars).unwrap();
        let config = BacktestConfig {
            start_date: start,
            end_date: start + chrono::Duration::days(60),
            initial_capital: 10_000.0,
            commission: 0.001,
            margin: 1.0,
            trade_on_close: false,
            risk_free_rate: 0.0,
        };
        run_backtest(&series, &StrategyParams::default(), &config).unwrap()
    }

    #[test]
    fn writes_all_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested").join("report");
        let result = result();
        let metrics = Metrics::compute(&result, 0.0);

        CsvReportAdapter::new()
            .write(&result, &metrics, &out)
            .unwrap();

        let trades = fs::read_to_string(out.join(TRADES_FILE)).unwrap();
        let mut lines = trades.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("direction,size,entry_date,exit_date"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("Long,"));
        assert!(row.ends_with("EndOfData"));
        assert!(lines.next().is_none());

        let signals = fs::read_to_string(out.join(SIGNALS_FILE)).unwrap();
        let rows: Vec<&str> = signals.lines().collect();
        assert_eq!(
            rows[0],
            "date,close,mean,std,z,upper_band,lower_band,state,action"
        );
        assert_eq!(rows.len(), 31);
        // warmup rows leave the stats columns empty
        assert_eq!(rows[1], "2020-01-01,100.0,,,,,,FLAT,HOLD");
        assert!(rows[26].ends_with("LONG,OPEN_LONG"));

        let equity = fs::read_to_string(out.join(EQUITY_FILE)).unwrap();
        assert_eq!(equity.lines().next(), Some("date,equity"));
        assert_eq!(equity.lines().count(), 31);
    }

    #[test]
    fn unwritable_output_dir() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let result = result();
        let metrics = Metrics::compute(&result, 0.0);

        let err = CsvReportAdapter::new()
            .write(&result, &metrics, &blocker.join("out"))
            .unwrap_err();
        assert!(matches!(err, ZrevertError::Report { .. }));
    }
}
