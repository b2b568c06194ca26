//! Backtest engine and event loop.
//!
//! Bars are walked in ascending date order. At each bar any order left
//! pending by the previous bar is filled at this bar's open, then the state
//! machine reads the precomputed z-score and may emit one transition. With
//! `trade_on_close` the transition fills immediately at this bar's close
//! instead. A position still open after the last bar is closed at the last
//! close.

use chrono::NaiveDate;

use super::error::ZrevertError;
use super::execution::{self, EntryResult, ExecutionConfig};
use super::ohlcv::PriceSeries;
use super::portfolio::Portfolio;
use super::position::{Direction, ExitReason};
use super::signal::{SignalEngine, SignalSeries};
use super::state_machine::{PositionState, PositionStateMachine, Transition};
use super::strategy::StrategyParams;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub commission: f64,
    pub margin: f64,
    pub trade_on_close: bool,
    pub risk_free_rate: f64,
}

impl BacktestConfig {
    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            commission: self.commission,
            margin: self.margin,
        }
    }

    pub fn validate(&self) -> Result<(), ZrevertError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(ZrevertError::invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
        if !(0.0..1.0).contains(&self.commission) {
            return Err(ZrevertError::invalid(
                "backtest",
                "commission",
                "commission must be in [0, 1)",
            ));
        }
        if !(self.margin > 0.0 && self.margin <= 1.0) {
            return Err(ZrevertError::invalid(
                "backtest",
                "margin",
                "margin must be in (0, 1]",
            ));
        }
        if !(0.0..1.0).contains(&self.risk_free_rate) {
            return Err(ZrevertError::invalid(
                "backtest",
                "risk_free_rate",
                "risk_free_rate must be between 0 and 1",
            ));
        }
        if self.start_date >= self.end_date {
            return Err(ZrevertError::invalid(
                "data",
                "start_date",
                "start_date must be before end_date",
            ));
        }
        Ok(())
    }
}

/// What the state machine decided at one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub index: usize,
    pub date: NaiveDate,
    pub transition: Transition,
    /// State after the bar, including any rejected open.
    pub state: PositionState,
    /// Whether a position was held when the bar closed.
    pub in_market: bool,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub code: String,
    pub params: StrategyParams,
    pub signals: SignalSeries,
    pub steps: Vec<StepRecord>,
    pub portfolio: Portfolio,
    pub first_close: f64,
    pub last_close: f64,
}

impl BacktestResult {
    /// Non-hold transitions in bar order.
    pub fn transitions(&self) -> Vec<(usize, Transition)> {
        self.steps
            .iter()
            .filter(|s| s.transition != Transition::Hold)
            .map(|s| (s.index, s.transition))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Order {
    Open(Direction),
    Close,
}

impl Order {
    fn from_transition(transition: Transition) -> Option<Self> {
        match transition {
            Transition::OpenLong => Some(Order::Open(Direction::Long)),
            Transition::OpenShort => Some(Order::Open(Direction::Short)),
            Transition::Close => Some(Order::Close),
            Transition::Hold => None,
        }
    }
}

struct Simulation<'a> {
    params: &'a StrategyParams,
    execution: ExecutionConfig,
    machine: PositionStateMachine,
    portfolio: Portfolio,
}

impl Simulation<'_> {
    fn fill(&mut self, order: Order, price: f64, date: NaiveDate, index: usize) {
        match order {
            Order::Open(direction) => {
                let result = execution::enter(
                    &mut self.portfolio,
                    direction,
                    price,
                    date,
                    index,
                    self.params.position_size,
                    &self.execution,
                );
                match result {
                    EntryResult::Entered { size, price, .. } => {
                        tracing::debug!(%date, %direction, size, price, "opened position");
                    }
                    EntryResult::InsufficientCapital => {
                        tracing::warn!(
                            %date,
                            %direction,
                            price,
                            cash = self.portfolio.cash,
                            "insufficient capital, order rejected"
                        );
                        self.machine.reject_open();
                    }
                }
            }
            Order::Close => {
                if let Some(trade) = execution::exit_position(
                    &mut self.portfolio,
                    price,
                    date,
                    index,
                    ExitReason::Signal,
                    &self.execution,
                ) {
                    tracing::debug!(
                        %date,
                        price,
                        pnl = trade.pnl,
                        bars = trade.bars_held(),
                        "closed position"
                    );
                }
            }
        }
    }
}

pub fn run_backtest(
    series: &PriceSeries,
    params: &StrategyParams,
    config: &BacktestConfig,
) -> Result<BacktestResult, ZrevertError> {
    let engine = SignalEngine::new(params)?;
    config.validate()?;

    if series.len() < engine.lookback() {
        tracing::warn!(
            code = series.code(),
            bars = series.len(),
            lookback = engine.lookback(),
            "series shorter than lookback, no signal will be produced"
        );
    }

    let signals = engine.compute(series);
    let mut sim = Simulation {
        params,
        execution: config.execution(),
        machine: PositionStateMachine::new(params),
        portfolio: Portfolio::new(config.initial_capital),
    };
    let mut steps = Vec::with_capacity(series.len());
    let mut pending: Option<Transition> = None;

    for (i, (bar, point)) in series.bars().iter().zip(&signals.points).enumerate() {
        if let Some(order) = pending.take().and_then(Order::from_transition) {
            sim.fill(order, bar.open, bar.date, i);
        }

        let transition = sim.machine.step(point.z);
        if let Some(order) = Order::from_transition(transition) {
            tracing::debug!(
                date = %bar.date,
                z = point.z.unwrap_or_default(),
                %transition,
                "signal"
            );
            if config.trade_on_close {
                sim.fill(order, bar.close, bar.date, i);
            } else {
                pending = Some(transition);
            }
        }

        sim.portfolio.record_equity(bar.date, bar.close);
        steps.push(StepRecord {
            index: i,
            date: bar.date,
            transition,
            state: sim.machine.state(),
            in_market: sim.portfolio.has_position(),
        });
    }

    if let Some(transition) = pending {
        tracing::info!(%transition, "order generated on last bar dropped");
        if transition.is_open() {
            sim.machine.reject_open();
        }
    }

    let last = series.last();
    let last_index = series.len() - 1;
    if let Some(trade) = execution::exit_position(
        &mut sim.portfolio,
        last.close,
        last.date,
        last_index,
        ExitReason::EndOfData,
        &sim.execution,
    ) {
        tracing::info!(date = %last.date, pnl = trade.pnl, "closed open position at end of data");
        let cash = sim.portfolio.cash;
        if let Some(point) = sim.portfolio.equity_curve.last_mut() {
            point.equity = cash;
        }
    }

    tracing::info!(
        code = series.code(),
        bars = series.len(),
        trades = sim.portfolio.closed_trades.len(),
        final_equity = sim.portfolio.cash,
        "backtest complete"
    );

    Ok(BacktestResult {
        code: series.code().to_string(),
        params: params.clone(),
        signals,
        steps,
        portfolio: sim.portfolio,
        first_close: series.first().close,
        last_close: last.close,
    })
}
