//! Pipeline → signal → simulator chains used by prediction and backtest
//! front-ends.

use super::backtest::{simulate, BacktestConfig, BacktestResult};
use super::candle::Candle;
use super::error::TraderError;
use super::indicator::IndicatorParams;
use super::labeler::feature_vector;
use super::pipeline::compute_features;
use super::prediction::{Prediction, Predictor};
use super::signal::{annotate, SignalRow};

pub const DEFAULT_RECENT_SIGNALS: usize = 50;

/// Summary handed to backtest renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub final_value: f64,
    pub trade_count: usize,
    pub equity_curve: Vec<f64>,
}

impl From<&BacktestResult> for BacktestReport {
    fn from(result: &BacktestResult) -> Self {
        BacktestReport {
            final_value: result.final_value,
            trade_count: result.trade_count(),
            equity_curve: result.equity_curve.iter().map(|p| p.equity).collect(),
        }
    }
}

pub fn signal_rows(candles: &[Candle], params: &IndicatorParams) -> Vec<SignalRow> {
    annotate(&compute_features(candles, params))
}

/// The last `n` annotated rows, oldest first.
pub fn recent_signals(candles: &[Candle], params: &IndicatorParams, n: usize) -> Vec<SignalRow> {
    let mut rows = signal_rows(candles, params);
    let skip = rows.len().saturating_sub(n);
    rows.drain(..skip);
    rows
}

pub fn latest_signal(candles: &[Candle], params: &IndicatorParams) -> Option<SignalRow> {
    signal_rows(candles, params).pop()
}

pub fn run_backtest(
    candles: &[Candle],
    params: &IndicatorParams,
    config: &BacktestConfig,
) -> BacktestResult {
    simulate(&signal_rows(candles, params), config)
}

pub fn backtest_candles(
    candles: &[Candle],
    params: &IndicatorParams,
    config: &BacktestConfig,
) -> BacktestReport {
    BacktestReport::from(&run_backtest(candles, params, config))
}

/// A model's call on the newest complete feature row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatestPrediction {
    pub timestamp: i64,
    pub close: f64,
    pub prediction: Prediction,
}

/// Score the last complete feature row with `model`.
///
/// No complete row (short or degenerate history) is `InsufficientHistory`
/// counted in feature rows.
pub fn predict_latest<P: Predictor + ?Sized>(
    candles: &[Candle],
    params: &IndicatorParams,
    model: &P,
) -> Result<LatestPrediction, TraderError> {
    let rows = compute_features(candles, params);
    let last = rows
        .last()
        .ok_or(TraderError::InsufficientHistory { have: 0, need: 1 })?;
    let prediction = model.predict(&feature_vector(last))?;
    Ok(LatestPrediction {
        timestamp: last.timestamp(),
        close: last.close(),
        prediction,
    })
}
