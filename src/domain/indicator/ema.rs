//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the first value (no bias correction), then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k). Defined from the first bar.

use super::Series;

pub fn ema(values: &[f64], span: usize) -> Series {
    if span == 0 {
        return vec![None; values.len()];
    }

    let k = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for &value in values {
        let next = match prev {
            None => value,
            Some(ema) => value * k + ema * (1.0 - k),
        };
        prev = Some(next);
        out.push(Some(next));
    }

    out
}
