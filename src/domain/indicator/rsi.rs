//! RSI (Relative Strength Index).
//!
//! Average gain and average loss are simple rolling means of the last `n`
//! close-to-close deltas (not Wilder's smoothing):
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//!
//! The first `n` bars are undefined (n deltas need n+1 closes). A window
//! with avg_loss == 0 has no defined ratio, so RSI is undefined there too.

use super::Series;

pub fn rsi(closes: &[f64], period: usize) -> Series {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    // delta[i] pairs closes[i] with closes[i - 1]; delta[0] is unused
    let mut gains = vec![0.0; closes.len()];
    let mut losses = vec![0.0; closes.len()];
    for i in 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        gains[i] = if change > 0.0 { change } else { 0.0 };
        losses[i] = if change < 0.0 { -change } else { 0.0 };
    }

    for i in period..closes.len() {
        let window = i + 1 - period..=i;
        let avg_gain = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[window].iter().sum::<f64>() / period as f64;
        if avg_loss == 0.0 {
            continue;
        }
        out[i] = Some(100.0 - (100.0 / (1.0 + avg_gain / avg_loss)));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_empty() {
        assert!(rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (0..20)
            .map(|i| 100.0 + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let series = rsi(&closes, 14);
        assert_eq!(series.len(), 20);
        for (i, value) in series.iter().enumerate().take(14) {
            assert!(value.is_none(), "bar {i} should be undefined");
        }
        assert!(series[14].is_some());
    }

    #[test]
    fn rsi_simple_mean_not_wilder() {
        // deltas: +1, -1, +2
        let series = rsi(&[1.0, 2.0, 1.0, 3.0], 2);
        assert!((series[2].unwrap() - 50.0).abs() < 1e-12);
        // avg_gain=1.0, avg_loss=0.5 → rs=2 → 100 - 100/3
        assert!((series[3].unwrap() - (100.0 - 100.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn rsi_all_gains_is_undefined() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert!(rsi(&closes, 14).iter().all(Option::is_none));
    }

    #[test]
    fn rsi_flat_is_undefined() {
        assert!(rsi(&[100.0; 30], 14).iter().all(Option::is_none));
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..16).map(|i| 100.0 - i as f64).collect();
        let series = rsi(&closes, 14);
        assert!((series[14].unwrap() - 0.0).abs() < f64::EPSILON);
        assert!((series[15].unwrap() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_in_range() {
        let closes: Vec<f64> = (1..=40)
            .map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0)
            .collect();
        for value in rsi(&closes, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value), "RSI {value} out of range");
        }
    }

    #[test]
    fn rsi_zero_period() {
        assert_eq!(rsi(&[1.0, 2.0], 0), vec![None, None]);
    }
}
