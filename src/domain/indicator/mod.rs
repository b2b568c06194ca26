//! Rolling-window indicators.
//!
//! Values that cannot be computed yet (warmup) are `None`, never zero.

pub mod stddev;

pub use stddev::{RollingStats, rolling_stats};
