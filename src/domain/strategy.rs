//! Strategy parameters for the z-score mean-reversion rule.

use super::error::ZrevertError;

pub const DEFAULT_LOOKBACK: usize = 20;
pub const DEFAULT_ENTRY_Z: f64 = 2.0;
pub const DEFAULT_EXIT_Z: f64 = 0.5;
pub const DEFAULT_POSITION_SIZE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    /// Trailing window length for the rolling mean and standard deviation.
    pub lookback: usize,
    /// Z-score magnitude that opens a position.
    pub entry_z: f64,
    /// Z-score magnitude inside which an open position is closed.
    pub exit_z: f64,
    /// Fraction of available cash committed to each entry.
    pub position_size: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            lookback: DEFAULT_LOOKBACK,
            entry_z: DEFAULT_ENTRY_Z,
            exit_z: DEFAULT_EXIT_Z,
            position_size: DEFAULT_POSITION_SIZE,
        }
    }
}

impl StrategyParams {
    /// Reject out-of-range parameters. Values are never clamped.
    pub fn validate(&self) -> Result<(), ZrevertError> {
        if self.lookback < 2 {
            return Err(ZrevertError::invalid(
                "strategy",
                "lookback",
                "lookback must be at least 2",
            ));
        }
        if !(self.entry_z.is_finite() && self.entry_z > 0.0) {
            return Err(ZrevertError::invalid(
                "strategy",
                "entry_z",
                "entry_z must be a positive number",
            ));
        }
        if !(self.exit_z.is_finite() && self.exit_z > 0.0) {
            return Err(ZrevertError::invalid(
                "strategy",
                "exit_z",
                "exit_z must be a positive number",
            ));
        }
        if !(self.position_size > 0.0 && self.position_size <= 1.0) {
            return Err(ZrevertError::invalid(
                "strategy",
                "position_size",
                "position_size must be between 0 and 1",
            ));
        }
        Ok(())
    }

    pub fn describe(&self) -> String {
        format!(
            "ZScoreMeanReversion(lookback={}, entry_z={}, exit_z={})",
            self.lookback, self.entry_z, self.exit_z
        )
    }
}
