//! Cash, the single open position, and equity tracking.

use chrono::NaiveDate;
use serde::Serialize;

use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    /// Bars that ended with a position open.
    pub bars_in_market: usize,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
            bars_in_market: 0,
        }
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    pub fn open(&mut self, position: Position) {
        debug_assert!(self.position.is_none(), "at most one open position");
        self.position = Some(position);
    }

    pub fn take_position(&mut self) -> Option<Position> {
        self.position.take()
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.closed_trades.push(trade);
    }

    /// cash + reserved margin + unrealized pnl at `price`.
    pub fn total_equity(&self, price: f64) -> f64 {
        let position_value = self
            .position
            .as_ref()
            .map(|pos| pos.margin_reserved + pos.unrealized_pnl(price))
            .unwrap_or(0.0);
        self.cash + position_value
    }

    pub fn record_equity(&mut self, date: NaiveDate, price: f64) {
        if self.position.is_some() {
            self.bars_in_market += 1;
        }
        let equity = self.total_equity(price);
        self.equity_curve.push(EquityPoint { date, equity });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::Direction;

    fn sample_position(direction: Direction) -> Position {
        Position {
            direction,
            size: 100,
            entry_price: 100.0,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            entry_index: 0,
            entry_commission: 0.0,
            margin_reserved: 10_000.0,
        }
    }

    #[test]
    fn new_portfolio() {
        let portfolio = Portfolio::new(10_000.0);
        assert!((portfolio.cash - 10_000.0).abs() < f64::EPSILON);
        assert!((portfolio.initial_capital - 10_000.0).abs() < f64::EPSILON);
        assert!(!portfolio.has_position());
        assert!(portfolio.closed_trades.is_empty());
        assert!(portfolio.equity_curve.is_empty());
    }

    #[test]
    fn open_and_take_position() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.open(sample_position(Direction::Long));
        assert!(portfolio.has_position());

        let taken = portfolio.take_position();
        assert!(taken.is_some());
        assert!(!portfolio.has_position());
        assert!(portfolio.take_position().is_none());
    }

    #[test]
    fn total_equity_no_position() {
        let portfolio = Portfolio::new(10_000.0);
        assert!((portfolio.total_equity(123.0) - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn total_equity_long() {
        let mut portfolio = Portfolio::new(20_000.0);
        portfolio.cash = 10_000.0;
        portfolio.open(sample_position(Direction::Long));
        // 10_000 cash + 10_000 margin + 100 * (110 - 100)
        assert!((portfolio.total_equity(110.0) - 21_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn total_equity_short() {
        let mut portfolio = Portfolio::new(20_000.0);
        portfolio.cash = 10_000.0;
        portfolio.open(sample_position(Direction::Short));
        assert!((portfolio.total_equity(110.0) - 19_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn record_equity_counts_exposure() {
        let mut portfolio = Portfolio::new(10_000.0);
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        portfolio.record_equity(date, 100.0);
        portfolio.cash = 0.0;
        portfolio.open(sample_position(Direction::Long));
        portfolio.record_equity(date + chrono::Duration::days(1), 101.0);

        assert_eq!(portfolio.equity_curve.len(), 2);
        assert_eq!(portfolio.bars_in_market, 1);
        assert!((portfolio.equity_curve[1].equity - 10_100.0).abs() < f64::EPSILON);
    }
}
