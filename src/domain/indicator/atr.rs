//! Average True Range: rolling mean of the true range.
//!
//! The first bar has no previous close, so its true range is high - low.

use super::{rolling_mean, Series};
use crate::domain::candle::Candle;

pub fn atr(candles: &[Candle], period: usize) -> Series {
    let true_ranges: Vec<f64> = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            if i == 0 {
                candle.high - candle.low
            } else {
                candle.true_range(candles[i - 1].close)
            }
        })
        .collect();

    rolling_mean(&true_ranges, period)
}
