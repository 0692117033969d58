//! Technical indicator primitives.
//!
//! Every primitive maps a slice of inputs to a [`Series`] of the same length
//! where `None` marks a bar whose value is undefined (not enough lookback,
//! or a division by zero). Callers drop such rows; nothing here fails.

pub mod atr;
pub mod ema;
pub mod returns;
pub mod rsi;
pub mod sma;

use crate::domain::error::TraderError;

pub type Series = Vec<Option<f64>>;

/// Window lengths for the feature pipeline. Every window is at least 1;
/// build custom windows through [`IndicatorParams::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorParams {
    ema_short: usize,
    ema_long: usize,
    sma: usize,
    rsi: usize,
    atr: usize,
    volume_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            ema_short: 9,
            ema_long: 21,
            sma: 50,
            rsi: 14,
            atr: 14,
            volume_window: 20,
        }
    }
}

impl IndicatorParams {
    pub fn new(
        ema_short: usize,
        ema_long: usize,
        sma: usize,
        rsi: usize,
        atr: usize,
        volume_window: usize,
    ) -> Result<Self, TraderError> {
        let windows = [
            ("ema_short", ema_short),
            ("ema_long", ema_long),
            ("sma", sma),
            ("rsi", rsi),
            ("atr", atr),
            ("volume_window", volume_window),
        ];
        for (key, window) in windows {
            if window == 0 {
                return Err(TraderError::config_invalid(
                    "indicators",
                    key,
                    "window must be at least 1",
                ));
            }
        }
        Ok(IndicatorParams {
            ema_short,
            ema_long,
            sma,
            rsi,
            atr,
            volume_window,
        })
    }

    pub fn ema_short(&self) -> usize {
        self.ema_short
    }

    pub fn ema_long(&self) -> usize {
        self.ema_long
    }

    pub fn sma(&self) -> usize {
        self.sma
    }

    pub fn rsi(&self) -> usize {
        self.rsi
    }

    pub fn atr(&self) -> usize {
        self.atr
    }

    pub fn volume_window(&self) -> usize {
        self.volume_window
    }

    /// Largest configured window; bounds the warm-up of the pipeline.
    pub fn max_window(&self) -> usize {
        [
            self.ema_short,
            self.ema_long,
            self.sma,
            self.rsi,
            self.atr,
            self.volume_window,
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
    }
}

/// Trailing arithmetic mean; defined once `window` inputs are available.
pub fn rolling_mean(values: &[f64], window: usize) -> Series {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                let slice = &values[i + 1 - window..=i];
                Some(slice.iter().sum::<f64>() / window as f64)
            }
        })
        .collect()
}
