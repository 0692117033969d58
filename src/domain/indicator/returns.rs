//! Percentage change over `n` bars: (C[i] - C[i-n]) / C[i-n].
//!
//! Undefined for the first `n` bars and where the base value is zero.

use super::Series;

pub fn pct_change(values: &[f64], n: usize) -> Series {
    (0..values.len())
        .map(|i| {
            if n == 0 || i < n {
                return None;
            }
            let base = values[i - n];
            if base == 0.0 {
                None
            } else {
                Some((values[i] - base) / base)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_bar_change() {
        let series = pct_change(&[100.0, 110.0, 99.0], 1);
        assert_eq!(series[0], None);
        assert!((series[1].unwrap() - 0.1).abs() < 1e-12);
        assert!((series[2].unwrap() - (-0.1)).abs() < 1e-12);
    }

    #[test]
    fn three_bar_change() {
        let series = pct_change(&[100.0, 101.0, 102.0, 120.0], 3);
        assert!(series[..3].iter().all(Option::is_none));
        assert!((series[3].unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn zero_base_is_undefined() {
        let series = pct_change(&[0.0, 5.0], 1);
        assert_eq!(series[1], None);
    }
}
