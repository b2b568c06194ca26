//! Z-score signal engine.
//!
//! For each bar the engine precomputes the rolling mean and sample standard
//! deviation of the close over `lookback` bars, the z-score of the close
//! against those stats, and the entry bands `mean ± entry_z · std`.
//!
//! Everything is `None` during warmup (`t < lookback - 1`). The z-score is
//! also `None` when the window has zero variance, so a flat price run never
//! produces a signal.

use chrono::NaiveDate;

use super::error::ZrevertError;
use super::indicator::{RollingStats, rolling_stats};
use super::ohlcv::PriceSeries;
use super::strategy::StrategyParams;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub stats: Option<RollingStats>,
    pub z: Option<f64>,
    entry_z: f64,
}

impl SignalPoint {
    pub fn mean(&self) -> Option<f64> {
        self.stats.map(|s| s.mean)
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.stats.map(|s| s.std_dev)
    }

    pub fn upper_band(&self) -> Option<f64> {
        self.stats.map(|s| s.mean + self.entry_z * s.std_dev)
    }

    pub fn lower_band(&self) -> Option<f64> {
        self.stats.map(|s| s.mean - self.entry_z * s.std_dev)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    pub points: Vec<SignalPoint>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn z_at(&self, index: usize) -> Option<f64> {
        self.points.get(index).and_then(|p| p.z)
    }

    /// Index of the first bar with a defined z-score.
    pub fn first_signal_index(&self) -> Option<usize> {
        self.points.iter().position(|p| p.z.is_some())
    }
}

#[derive(Debug, Clone)]
pub struct SignalEngine {
    lookback: usize,
    entry_z: f64,
}

impl SignalEngine {
    pub fn new(params: &StrategyParams) -> Result<Self, ZrevertError> {
        params.validate()?;
        Ok(Self {
            lookback: params.lookback,
            entry_z: params.entry_z,
        })
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    pub fn compute(&self, series: &PriceSeries) -> SignalSeries {
        let closes = series.closes();
        let stats = rolling_stats(&closes, self.lookback);

        let points = series
            .bars()
            .iter()
            .zip(stats)
            .map(|(bar, stats)| SignalPoint {
                date: bar.date,
                close: bar.close,
                z: stats.and_then(|s| z_score(bar.close, s)),
                stats,
                entry_z: self.entry_z,
            })
            .collect();

        SignalSeries { points }
    }
}

fn z_score(close: f64, stats: RollingStats) -> Option<f64> {
    if stats.std_dev > 0.0 && stats.std_dev.is_finite() {
        Some((close - stats.mean) / stats.std_dev)
    } else {
        None
    }
}
