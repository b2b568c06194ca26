//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::ZrevertError;
use crate::domain::metrics::Metrics;
use std::path::Path;

/// Port for writing backtest output.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        metrics: &Metrics,
        output_dir: &Path,
    ) -> Result<(), ZrevertError>;
}
