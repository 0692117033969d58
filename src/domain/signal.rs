//! Rule-based signal classifier.
//!
//! Each row is classified on its own: EMA crossover direction gated by RSI.
//! There is no state between rows, so identical inputs always produce
//! identical signals.

use std::fmt;

use super::candle::Candle;
use super::pipeline::{FeatureRow, FrameRow};

/// Confidence reported when a required feature is missing or not finite.
pub const MISSING_CONFIDENCE: f64 = 0.2;
/// Confidence reported when features are valid but neither rule fires.
pub const NEUTRAL_CONFIDENCE: f64 = 0.25;
pub const DEFAULT_RISK: f64 = 0.5;
pub const MIN_RISK: f64 = 0.05;

const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "Buy"),
            Action::Sell => write!(f, "Sell"),
            Action::Hold => write!(f, "Hold"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub action: Action,
    pub confidence: f64,
    pub risk: f64,
}

impl Signal {
    fn hold(confidence: f64) -> Self {
        Signal {
            action: Action::Hold,
            confidence,
            risk: DEFAULT_RISK,
        }
    }
}

/// The subset of a feature row the rules look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalInputs {
    pub close: f64,
    pub ema_short: Option<f64>,
    pub ema_long: Option<f64>,
    pub rsi: Option<f64>,
}

impl From<&FeatureRow> for SignalInputs {
    fn from(row: &FeatureRow) -> Self {
        SignalInputs {
            close: row.candle.close,
            ema_short: Some(row.ema_short),
            ema_long: Some(row.ema_long),
            rsi: Some(row.rsi),
        }
    }
}

impl From<&FrameRow> for SignalInputs {
    fn from(row: &FrameRow) -> Self {
        SignalInputs {
            close: row.candle.close,
            ema_short: row.ema_short,
            ema_long: row.ema_long,
            rsi: row.rsi,
        }
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

pub fn classify(inputs: &SignalInputs) -> Signal {
    let (Some(ema_short), Some(ema_long), Some(rsi)) = (
        finite(inputs.ema_short),
        finite(inputs.ema_long),
        finite(inputs.rsi),
    ) else {
        return Signal::hold(MISSING_CONFIDENCE);
    };
    if !inputs.close.is_finite() {
        return Signal::hold(MISSING_CONFIDENCE);
    }

    let gap = if inputs.close != 0.0 {
        (ema_short - ema_long).abs() / inputs.close
    } else {
        0.0
    };
    let risk = (0.5 - 3.0 * gap).clamp(MIN_RISK, 1.0);

    if ema_short > ema_long && rsi < RSI_OVERBOUGHT {
        let confidence = (0.25 + 3.0 * gap + (RSI_OVERBOUGHT - rsi) / 200.0).clamp(0.0, 1.0);
        return Signal {
            action: Action::Buy,
            confidence,
            risk,
        };
    }
    if ema_short < ema_long && rsi > RSI_OVERSOLD {
        let confidence = (0.25 + 3.0 * gap + (rsi - RSI_OVERSOLD) / 200.0).clamp(0.0, 1.0);
        return Signal {
            action: Action::Sell,
            confidence,
            risk,
        };
    }

    Signal::hold(NEUTRAL_CONFIDENCE)
}

/// A feature row together with its signal.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub features: FeatureRow,
    pub signal: Signal,
}

/// A raw frame row (possibly incomplete) together with its signal.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSignal {
    pub candle: Candle,
    pub signal: Signal,
}

pub fn annotate(rows: &[FeatureRow]) -> Vec<SignalRow> {
    rows.iter()
        .map(|row| SignalRow {
            features: row.clone(),
            signal: classify(&SignalInputs::from(row)),
        })
        .collect()
}

pub fn annotate_frame(rows: &[FrameRow]) -> Vec<FrameSignal> {
    rows.iter()
        .map(|row| FrameSignal {
            candle: row.candle,
            signal: classify(&SignalInputs::from(row)),
        })
        .collect()
}
