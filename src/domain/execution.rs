//! Trade execution and fill simulation.
//!
//! Fills happen at the bar close. Fees are charged as a fraction of the
//! notional and slippage degrades the effective price against the trader.

use std::fmt;

use super::backtest::BacktestConfig;
use super::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// One fill in the backtest trade log. `price` is the quoted close, before
/// fee and slippage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trade {
    pub timestamp: i64,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
}

/// Buy: execution_price = market_price * (1 + slippage)
pub fn apply_slippage_buy(market_price: f64, slippage: f64) -> f64 {
    market_price * (1.0 + slippage)
}

/// Sell: execution_price = market_price * (1 - slippage)
pub fn apply_slippage_sell(market_price: f64, slippage: f64) -> f64 {
    market_price * (1.0 - slippage)
}

/// Spend the whole cash balance on the asset.
///
/// quantity = cash * (1 - fee) / (price * (1 + slippage)). Returns `None`
/// when already invested or when the slipped price is not positive.
pub fn enter_long(
    position: &mut Position,
    timestamp: i64,
    market_price: f64,
    config: &BacktestConfig,
) -> Option<Trade> {
    if !position.is_flat() {
        return None;
    }

    let execution_price = apply_slippage_buy(market_price, config.slippage());
    if execution_price <= 0.0 {
        return None;
    }

    let quantity = (position.cash * (1.0 - config.fee())) / execution_price;
    position.quantity = quantity;
    position.cash = 0.0;

    Some(Trade {
        timestamp,
        side: Side::Buy,
        price: market_price,
        quantity,
    })
}

/// Sell the whole holding.
///
/// proceeds = quantity * price * (1 - fee) * (1 - slippage). Returns `None`
/// when nothing is held.
pub fn exit_long(
    position: &mut Position,
    timestamp: i64,
    market_price: f64,
    config: &BacktestConfig,
) -> Option<Trade> {
    if !position.is_long() {
        return None;
    }

    let quantity = position.quantity;
    let execution_price = apply_slippage_sell(market_price, config.slippage());
    let proceeds = quantity * execution_price * (1.0 - config.fee());
    position.cash = proceeds;
    position.quantity = 0.0;

    Some(Trade {
        timestamp,
        side: Side::Sell,
        price: market_price,
        quantity,
    })
}
