//! Candle window → feature table.
//!
//! Pure and deterministic. [`compute_frame`] yields one row per candle with
//! optional derived values; [`compute_features`] keeps only rows where every
//! derived value is defined (the warm-up rows are dropped).

use super::candle::Candle;
use super::indicator::atr::atr;
use super::indicator::ema::ema;
use super::indicator::returns::pct_change;
use super::indicator::rsi::rsi;
use super::indicator::sma::sma;
use super::indicator::{rolling_mean, IndicatorParams};

/// A candle with every derived value possibly undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRow {
    pub candle: Candle,
    pub ema_short: Option<f64>,
    pub ema_long: Option<f64>,
    pub sma50: Option<f64>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    pub ret_1: Option<f64>,
    pub ret_3: Option<f64>,
    pub vol_rolling: Option<f64>,
}

/// A candle whose derived values are all defined.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub candle: Candle,
    pub ema_short: f64,
    pub ema_long: f64,
    pub sma50: f64,
    pub rsi: f64,
    pub atr: f64,
    pub ret_1: f64,
    pub ret_3: f64,
    pub vol_rolling: f64,
}

impl FrameRow {
    pub fn complete(&self) -> Option<FeatureRow> {
        Some(FeatureRow {
            candle: self.candle,
            ema_short: self.ema_short?,
            ema_long: self.ema_long?,
            sma50: self.sma50?,
            rsi: self.rsi?,
            atr: self.atr?,
            ret_1: self.ret_1?,
            ret_3: self.ret_3?,
            vol_rolling: self.vol_rolling?,
        })
    }
}

impl FeatureRow {
    pub fn timestamp(&self) -> i64 {
        self.candle.timestamp
    }

    pub fn close(&self) -> f64 {
        self.candle.close
    }
}

pub fn compute_frame(candles: &[Candle], params: &IndicatorParams) -> Vec<FrameRow> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

    let ema_short = ema(&closes, params.ema_short());
    let ema_long = ema(&closes, params.ema_long());
    let sma50 = sma(&closes, params.sma());
    let rsi = rsi(&closes, params.rsi());
    let atr = atr(candles, params.atr());
    let ret_1 = pct_change(&closes, 1);
    let ret_3 = pct_change(&closes, 3);
    let vol_rolling = rolling_mean(&volumes, params.volume_window());

    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| FrameRow {
            candle: *candle,
            ema_short: ema_short[i],
            ema_long: ema_long[i],
            sma50: sma50[i],
            rsi: rsi[i],
            atr: atr[i],
            ret_1: ret_1[i],
            ret_3: ret_3[i],
            vol_rolling: vol_rolling[i],
        })
        .collect()
}

pub fn compute_features(candles: &[Candle], params: &IndicatorParams) -> Vec<FeatureRow> {
    compute_frame(candles, params)
        .iter()
        .filter_map(FrameRow::complete)
        .collect()
}
