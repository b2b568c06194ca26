//! Performance metrics and statistics.

use chrono::NaiveDate;

use super::backtest::BacktestResult;
use super::portfolio::EquityPoint;
use super::position::ClosedTrade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub duration_days: i64,
    pub exposure_time: f64,
    pub equity_final: f64,
    pub equity_peak: f64,
    pub total_return: f64,
    pub buy_and_hold_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub avg_trade: f64,
    pub max_trade_duration: i64,
    pub avg_trade_duration: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
}

impl Metrics {
    pub fn compute(result: &BacktestResult, risk_free_rate: f64) -> Self {
        let portfolio = &result.portfolio;
        let equity_curve = &portfolio.equity_curve;
        let initial_capital = portfolio.initial_capital;

        let start = equity_curve.first().map(|p| p.date);
        let end = equity_curve.last().map(|p| p.date);
        let duration_days = match (start, end) {
            (Some(s), Some(e)) => (e - s).num_days(),
            _ => 0,
        };

        let exposure_time = if equity_curve.is_empty() {
            0.0
        } else {
            portfolio.bars_in_market as f64 / equity_curve.len() as f64
        };

        let equity_final = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);
        let equity_peak = equity_curve
            .iter()
            .map(|p| p.equity)
            .fold(initial_capital, f64::max);

        let total_return = if initial_capital > 0.0 {
            (equity_final - initial_capital) / initial_capital
        } else {
            0.0
        };

        let buy_and_hold_return = if result.first_close > 0.0 {
            (result.last_close - result.first_close) / result.first_close
        } else {
            0.0
        };

        let years = equity_curve.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return.is_finite() && total_return > -1.0
        {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let risk = compute_risk_adjusted(equity_curve, daily_rf);

        let trades = TradeStats::from_trades(&portfolio.closed_trades);

        Metrics {
            start,
            end,
            duration_days,
            exposure_time,
            equity_final,
            equity_peak,
            total_return,
            buy_and_hold_return,
            annualized_return,
            annualized_volatility: risk.volatility,
            sharpe_ratio: risk.sharpe,
            sortino_ratio: risk.sortino,
            max_drawdown,
            max_drawdown_duration,
            total_trades: trades.total,
            trades_won: trades.won,
            trades_lost: trades.lost,
            win_rate: trades.win_rate,
            best_trade: trades.best,
            worst_trade: trades.worst,
            avg_trade: trades.avg_return,
            max_trade_duration: trades.max_duration,
            avg_trade_duration: trades.avg_duration,
            profit_factor: trades.profit_factor,
            expectancy: trades.expectancy,
        }
    }
}

#[derive(Debug, Default)]
struct TradeStats {
    total: usize,
    won: usize,
    lost: usize,
    win_rate: f64,
    best: f64,
    worst: f64,
    avg_return: f64,
    max_duration: i64,
    avg_duration: f64,
    profit_factor: f64,
    expectancy: f64,
}

impl TradeStats {
    fn from_trades(trades: &[ClosedTrade]) -> Self {
        if trades.is_empty() {
            return TradeStats::default();
        }

        let mut won = 0usize;
        let mut lost = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut best = f64::NEG_INFINITY;
        let mut worst = f64::INFINITY;
        let mut total_return = 0.0_f64;
        let mut total_pnl = 0.0_f64;
        let mut total_duration = 0i64;
        let mut max_duration = 0i64;

        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                won += 1;
                total_wins += pnl;
            } else if pnl < 0.0 {
                lost += 1;
                total_losses += pnl.abs();
            }
            best = best.max(trade.return_pct);
            worst = worst.min(trade.return_pct);
            total_return += trade.return_pct;
            total_pnl += pnl;

            let duration = trade.duration_days();
            total_duration += duration;
            max_duration = max_duration.max(duration);
        }

        let n = trades.len() as f64;
        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        TradeStats {
            total: trades.len(),
            won,
            lost,
            win_rate: won as f64 / n,
            best,
            worst,
            avg_return: total_return / n,
            max_duration,
            avg_duration: total_duration as f64 / n,
            profit_factor,
            expectancy: total_pnl / n,
        }
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, i64) {
    if equity_curve.is_empty() {
        return (0.0, 0);
    }

    let mut peak = equity_curve[0].equity;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}

struct RiskAdjusted {
    volatility: f64,
    sharpe: f64,
    sortino: f64,
}

fn compute_risk_adjusted(equity_curve: &[EquityPoint], daily_rf: f64) -> RiskAdjusted {
    let zero = RiskAdjusted {
        volatility: 0.0,
        sharpe: 0.0,
        sortino: 0.0,
    };
    if equity_curve.len() < 2 {
        return zero;
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            let curr = w[1].equity;
            if prev > 0.0 {
                (curr - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;

    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    let annualizer = TRADING_DAYS_PER_YEAR.sqrt();

    let excess_return = mean - daily_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * annualizer
    } else {
        0.0
    };

    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sq / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * annualizer
    } else {
        0.0
    };

    RiskAdjusted {
        volatility: stddev * annualizer,
        sharpe,
        sortino,
    }
}
