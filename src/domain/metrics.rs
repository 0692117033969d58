//! Performance metrics derived from a backtest result.

use super::backtest::{BacktestConfig, BacktestResult, EquityPoint};
use super::execution::{Side, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub max_drawdown: f64,
    pub max_drawdown_bars: usize,
    pub round_trips: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
}

impl Metrics {
    pub fn compute(result: &BacktestResult, config: &BacktestConfig) -> Self {
        let total_return = if result.initial_balance > 0.0 {
            (result.final_value - result.initial_balance) / result.initial_balance
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_bars) = compute_drawdown(&result.equity_curve);

        let pnls = round_trip_pnls(&result.trades, config);
        let trades_won = pnls.iter().filter(|&&p| p > 0.0).count();
        let trades_lost = pnls.iter().filter(|&&p| p < 0.0).count();
        let win_rate = if pnls.is_empty() {
            0.0
        } else {
            trades_won as f64 / pnls.len() as f64
        };

        Metrics {
            total_return,
            max_drawdown,
            max_drawdown_bars,
            round_trips: pnls.len(),
            trades_won,
            trades_lost,
            win_rate,
        }
    }
}

/// Largest peak-to-trough fall as a fraction of the peak, and the longest
/// run of bars spent below a previous peak.
fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut max_duration = 0usize;
    let mut current_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_duration += 1;
            if current_duration > max_duration {
                max_duration = current_duration;
            }
        }
    }

    (max_dd, max_duration)
}

/// Net result of each completed buy→sell pair, after fees and slippage.
fn round_trip_pnls(trades: &[Trade], config: &BacktestConfig) -> Vec<f64> {
    let mut pnls = Vec::new();
    let mut entry_cost: Option<f64> = None;

    for trade in trades {
        match trade.side {
            Side::Buy => {
                let cost = trade.quantity * trade.price * (1.0 + config.slippage())
                    / (1.0 - config.fee());
                entry_cost = Some(cost);
            }
            Side::Sell => {
                if let Some(cost) = entry_cost.take() {
                    let proceeds = trade.quantity
                        * trade.price
                        * (1.0 - config.fee())
                        * (1.0 - config.slippage());
                    pnls.push(proceeds - cost);
                }
            }
        }
    }

    pnls
}
