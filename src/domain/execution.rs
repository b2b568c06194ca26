//! Fill simulation: sizing, commissions, margin.
//!
//! Entries reserve `notional * margin` out of cash and pay
//! `notional * commission`. Exits release the reserved margin, settle the
//! price pnl and pay commission on the exit notional.

use chrono::NaiveDate;

use super::portfolio::Portfolio;
use super::position::{ClosedTrade, Direction, ExitReason, Position};

pub const DEFAULT_COMMISSION: f64 = 0.001;
pub const DEFAULT_MARGIN: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    /// Fraction of notional charged per side.
    pub commission: f64,
    /// Fraction of notional held as collateral; 1.0 means no leverage.
    pub margin: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission: DEFAULT_COMMISSION,
            margin: DEFAULT_MARGIN,
        }
    }
}

pub fn calculate_commission(trade_value: f64, config: &ExecutionConfig) -> f64 {
    trade_value * config.commission
}

/// Whole shares affordable with `cash * position_size`, leaving room for
/// margin and entry commission.
pub fn order_size(cash: f64, price: f64, position_size: f64, config: &ExecutionConfig) -> u64 {
    if cash <= 0.0 || price <= 0.0 {
        return 0;
    }
    let per_share = price * (config.margin + config.commission);
    let size = (cash * position_size / per_share).floor();
    if size.is_finite() && size > 0.0 {
        size as u64
    } else {
        0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        size: u64,
        price: f64,
        commission: f64,
    },
    InsufficientCapital,
}

pub fn enter(
    portfolio: &mut Portfolio,
    direction: Direction,
    price: f64,
    date: NaiveDate,
    index: usize,
    position_size: f64,
    config: &ExecutionConfig,
) -> EntryResult {
    let size = order_size(portfolio.cash, price, position_size, config);
    if size == 0 {
        return EntryResult::InsufficientCapital;
    }

    let notional = size as f64 * price;
    let commission = calculate_commission(notional, config);
    let margin_reserved = notional * config.margin;

    if margin_reserved + commission > portfolio.cash {
        return EntryResult::InsufficientCapital;
    }

    portfolio.cash -= margin_reserved + commission;
    portfolio.open(Position {
        direction,
        size,
        entry_price: price,
        entry_date: date,
        entry_index: index,
        entry_commission: commission,
        margin_reserved,
    });

    EntryResult::Entered {
        size,
        price,
        commission,
    }
}

/// Close the open position, if any, and record the trade.
pub fn exit_position(
    portfolio: &mut Portfolio,
    price: f64,
    date: NaiveDate,
    index: usize,
    reason: ExitReason,
    config: &ExecutionConfig,
) -> Option<ClosedTrade> {
    let position = portfolio.take_position()?;

    let exit_commission = calculate_commission(position.notional(price), config);
    let price_pnl = position.unrealized_pnl(price);

    portfolio.cash += position.margin_reserved + price_pnl - exit_commission;

    let commission = position.entry_commission + exit_commission;
    let pnl = price_pnl - commission;
    let entry_notional = position.notional(position.entry_price);
    let return_pct = if entry_notional > 0.0 {
        pnl / entry_notional
    } else {
        0.0
    };

    let trade = ClosedTrade {
        direction: position.direction,
        size: position.signed_size(),
        entry_date: position.entry_date,
        exit_date: date,
        entry_index: position.entry_index,
        exit_index: index,
        entry_price: position.entry_price,
        exit_price: price,
        commission,
        pnl,
        return_pct,
        exit_reason: reason,
    };

    portfolio.record_trade(trade.clone());
    Some(trade)
}
