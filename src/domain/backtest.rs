//! Backtest simulator.
//!
//! Replays signal-annotated bars in order with a single all-in/all-out long
//! position: no partial fills, no shorting, no leverage. Equity is recorded
//! at the start of each bar, before that bar's action is applied.

use super::error::TraderError;
use super::execution::{enter_long, exit_long, Trade};
use super::position::Position;
use super::signal::{Action, FrameSignal, SignalRow};

pub const DEFAULT_INITIAL_BALANCE: f64 = 1000.0;
pub const DEFAULT_FEE: f64 = 0.00075;
pub const DEFAULT_SLIPPAGE: f64 = 0.0005;

/// Validated simulator parameters. Fee and slippage are fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    initial_balance: f64,
    fee: f64,
    slippage: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_balance: DEFAULT_INITIAL_BALANCE,
            fee: DEFAULT_FEE,
            slippage: DEFAULT_SLIPPAGE,
        }
    }
}

impl BacktestConfig {
    pub fn new(initial_balance: f64, fee: f64, slippage: f64) -> Result<Self, TraderError> {
        if !initial_balance.is_finite() || initial_balance <= 0.0 {
            return Err(TraderError::config_invalid(
                "backtest",
                "initial_balance",
                "initial_balance must be positive",
            ));
        }
        if !(0.0..1.0).contains(&fee) {
            return Err(TraderError::config_invalid(
                "backtest",
                "fee",
                "fee must be in [0, 1)",
            ));
        }
        if !(0.0..1.0).contains(&slippage) {
            return Err(TraderError::config_invalid(
                "backtest",
                "slippage",
                "slippage must be in [0, 1)",
            ));
        }
        Ok(BacktestConfig {
            initial_balance,
            fee,
            slippage,
        })
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn fee(&self) -> f64 {
        self.fee
    }

    pub fn slippage(&self) -> f64 {
        self.slippage
    }
}

/// Anything the simulator can replay: a timestamped close with an action.
pub trait SignalBar {
    fn timestamp(&self) -> i64;
    fn close(&self) -> f64;
    fn action(&self) -> Action;
}

impl SignalBar for SignalRow {
    fn timestamp(&self) -> i64 {
        self.features.candle.timestamp
    }

    fn close(&self) -> f64 {
        self.features.candle.close
    }

    fn action(&self) -> Action {
        self.signal.action
    }
}

impl SignalBar for FrameSignal {
    fn timestamp(&self) -> i64 {
        self.candle.timestamp
    }

    fn close(&self) -> f64 {
        self.candle.close
    }

    fn action(&self) -> Action {
        self.signal.action
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub timestamp: i64,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub initial_balance: f64,
    pub final_value: f64,
    pub final_position: Position,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl BacktestResult {
    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }
}

pub fn simulate<B: SignalBar>(bars: &[B], config: &BacktestConfig) -> BacktestResult {
    let mut position = Position::new(config.initial_balance());
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(bars.len());

    for bar in bars {
        let price = bar.close();
        equity_curve.push(EquityPoint {
            timestamp: bar.timestamp(),
            equity: position.equity(price),
        });

        let fill = match bar.action() {
            Action::Buy if position.is_flat() => {
                enter_long(&mut position, bar.timestamp(), price, config)
            }
            Action::Sell if position.is_long() => {
                exit_long(&mut position, bar.timestamp(), price, config)
            }
            _ => None,
        };
        if let Some(trade) = fill {
            trades.push(trade);
        }
    }

    let final_value = match bars.last() {
        Some(last) => position.equity(last.close()),
        None => position.cash,
    };

    BacktestResult {
        initial_balance: config.initial_balance(),
        final_value,
        final_position: position,
        trades,
        equity_curve,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::Candle;
    use crate::domain::execution::Side;
    use crate::domain::signal::Signal;
    use approx::assert_relative_eq;

    fn bar(timestamp: i64, close: f64, action: Action) -> FrameSignal {
        FrameSignal {
            candle: Candle {
                timestamp,
                open: close,
                high: close,
                low: close,
                close,
                volume: 1.0,
                is_closed: true,
            },
            signal: Signal {
                action,
                confidence: 0.5,
                risk: 0.5,
            },
        }
    }

    #[test]
    fn config_defaults() {
        let c = BacktestConfig::default();
        assert_relative_eq!(c.initial_balance(), 1000.0);
        assert_relative_eq!(c.fee(), 0.00075);
        assert_relative_eq!(c.slippage(), 0.0005);
    }

    #[test]
    fn negative_fee_fails_fast() {
        let err = BacktestConfig::new(1000.0, -0.001, 0.0).unwrap_err();
        assert!(err.to_string().contains("fee"));
    }

    #[test]
    fn invalid_balance_and_slippage_rejected() {
        assert!(BacktestConfig::new(0.0, 0.0, 0.0).is_err());
        assert!(BacktestConfig::new(f64::NAN, 0.0, 0.0).is_err());
        assert!(BacktestConfig::new(1000.0, 0.0, 1.0).is_err());
        assert!(BacktestConfig::new(1000.0, 0.0, -0.1).is_err());
        assert!(BacktestConfig::new(1000.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn empty_input_keeps_initial_balance() {
        let result = simulate::<FrameSignal>(&[], &BacktestConfig::default());
        assert_relative_eq!(result.final_value, 1000.0);
        assert!(result.trades.is_empty());
        assert!(result.equity_curve.is_empty());
    }

    #[test]
    fn equity_recorded_before_action() {
        let bars = vec![
            bar(1, 100.0, Action::Buy),
            bar(2, 110.0, Action::Hold),
            bar(3, 120.0, Action::Sell),
        ];
        let result = simulate(&bars, &BacktestConfig::default());

        assert_eq!(result.equity_curve.len(), 3);
        // bar 1 is marked before the buy executes
        assert_relative_eq!(result.equity_curve[0].equity, 1000.0);
        let qty = result.trades[0].quantity;
        assert_relative_eq!(result.equity_curve[1].equity, qty * 110.0, epsilon = 1e-9);
        assert_relative_eq!(result.equity_curve[2].equity, qty * 120.0, epsilon = 1e-9);
    }

    #[test]
    fn buy_then_sell_round_trip() {
        let bars = vec![
            bar(1, 100.0, Action::Buy),
            bar(2, 120.0, Action::Sell),
        ];
        let result = simulate(&bars, &BacktestConfig::default());

        assert_eq!(result.trade_count(), 2);
        assert_eq!(result.trades[0].side, Side::Buy);
        assert_eq!(result.trades[1].side, Side::Sell);
        let qty = (1000.0 * (1.0 - 0.00075)) / (100.0 * (1.0 + 0.0005));
        let proceeds = qty * 120.0 * (1.0 - 0.00075) * (1.0 - 0.0005);
        assert_relative_eq!(result.final_value, proceeds, epsilon = 1e-9);
        assert!(result.final_position.is_flat());
    }

    #[test]
    fn repeated_buys_do_not_pyramid() {
        let bars = vec![
            bar(1, 100.0, Action::Buy),
            bar(2, 101.0, Action::Buy),
            bar(3, 102.0, Action::Buy),
        ];
        let result = simulate(&bars, &BacktestConfig::default());
        assert_eq!(result.trade_count(), 1);
    }

    #[test]
    fn sell_without_position_is_ignored() {
        let bars = vec![bar(1, 100.0, Action::Sell), bar(2, 90.0, Action::Sell)];
        let result = simulate(&bars, &BacktestConfig::default());
        assert_eq!(result.trade_count(), 0);
        assert_relative_eq!(result.final_value, 1000.0);
    }

    #[test]
    fn open_position_marked_at_last_close() {
        let bars = vec![bar(1, 100.0, Action::Buy), bar(2, 150.0, Action::Hold)];
        let result = simulate(&bars, &BacktestConfig::default());
        let pos = result.final_position;
        assert_eq!(pos.cash, 0.0);
        assert_eq!(result.final_value, pos.cash + pos.quantity * 150.0);
    }
}
