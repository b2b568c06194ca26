//! Open positions and closed trade records.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub direction: Direction,
    /// Whole shares, always positive; direction carries the sign.
    pub size: u64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub entry_index: usize,
    pub entry_commission: f64,
    /// Collateral held out of cash while the position is open.
    pub margin_reserved: f64,
}

impl Position {
    /// Signed share count: positive long, negative short.
    pub fn signed_size(&self) -> i64 {
        match self.direction {
            Direction::Long => self.size as i64,
            Direction::Short => -(self.size as i64),
        }
    }

    pub fn notional(&self, price: f64) -> f64 {
        self.size as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.direction.sign() * self.size as f64 * (price - self.entry_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitReason {
    Signal,
    EndOfData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedTrade {
    pub direction: Direction,
    pub size: i64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    pub commission: f64,
    pub pnl: f64,
    /// pnl relative to entry notional.
    pub return_pct: f64,
    pub exit_reason: ExitReason,
}

impl ClosedTrade {
    pub fn duration_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_long_position() -> Position {
        Position {
            direction: Direction::Long,
            size: 100,
            entry_price: 50.0,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            entry_index: 3,
            entry_commission: 5.0,
            margin_reserved: 5_000.0,
        }
    }

    fn sample_short_position() -> Position {
        Position {
            direction: Direction::Short,
            size: 100,
            entry_price: 100.0,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            entry_index: 3,
            entry_commission: 10.0,
            margin_reserved: 10_000.0,
        }
    }

    #[test]
    fn signed_size_follows_direction() {
        assert_eq!(sample_long_position().signed_size(), 100);
        assert_eq!(sample_short_position().signed_size(), -100);
    }

    #[test]
    fn notional_ignores_direction() {
        assert!((sample_long_position().notional(55.0) - 5500.0).abs() < f64::EPSILON);
        assert!((sample_short_position().notional(95.0) - 9500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrealized_pnl_long() {
        let pos = sample_long_position();
        assert!((pos.unrealized_pnl(55.0) - 500.0).abs() < f64::EPSILON);
        assert!((pos.unrealized_pnl(45.0) - (-500.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn unrealized_pnl_short() {
        let pos = sample_short_position();
        assert!((pos.unrealized_pnl(90.0) - 1000.0).abs() < f64::EPSILON);
        assert!((pos.unrealized_pnl(110.0) - (-1000.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn closed_trade_duration() {
        let trade = ClosedTrade {
            direction: Direction::Long,
            size: 100,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            exit_date: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
            entry_index: 10,
            exit_index: 13,
            entry_price: 50.0,
            exit_price: 55.0,
            commission: 10.5,
            pnl: 489.5,
            return_pct: 0.0979,
            exit_reason: ExitReason::Signal,
        };
        assert_eq!(trade.duration_days(), 5);
        assert_eq!(trade.bars_held(), 3);
    }
}
