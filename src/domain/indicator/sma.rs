//! Simple Moving Average over the trailing `window` bars.

use super::{rolling_mean, Series};

pub fn sma(values: &[f64], window: usize) -> Series {
    rolling_mean(values, window)
}
