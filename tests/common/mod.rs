#![allow(dead_code)]

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use klinetrader::domain::candle::Candle;
use klinetrader::domain::error::TraderError;
use klinetrader::ports::history_port::HistoryPort;
use klinetrader::ports::stream_port::{KlineStream, StreamPort};
use parking_lot::Mutex;
use tokio::sync::mpsc;

pub fn make_candle(timestamp: i64, close: f64) -> Candle {
    Candle {
        timestamp,
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume: 10.0,
        is_closed: true,
    }
}

/// Candles at a fixed spacing with the given closes.
pub fn candles_from_closes(closes: &[f64], spacing: i64) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_candle(i as i64 * spacing, close))
        .collect()
}

pub fn flat_closes(count: usize, price: f64) -> Vec<f64> {
    vec![price; count]
}

/// Uptrend with pullbacks: +2, +2, -3 repeating.
pub fn rising_with_pullbacks(count: usize, start: f64) -> Vec<f64> {
    let steps = [2.0, 2.0, -3.0];
    let mut closes = Vec::with_capacity(count);
    let mut price = start;
    for i in 0..count {
        closes.push(price);
        price += steps[i % steps.len()];
    }
    closes
}

pub fn sine_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 100.0 + (i as f64 * 0.35).sin() * 4.0 + i as f64 * 0.02)
        .collect()
}

/// Binance-style kline stream message.
pub fn kline_message(candle: &Candle) -> String {
    serde_json::json!({
        "e": "kline",
        "s": "BTCUSDT",
        "k": {
            "t": candle.timestamp * 1000,
            "o": candle.open.to_string(),
            "h": candle.high.to_string(),
            "l": candle.low.to_string(),
            "c": candle.close.to_string(),
            "v": candle.volume.to_string(),
            "x": candle.is_closed
        }
    })
    .to_string()
}

pub struct MockHistoryPort {
    pub candles: Vec<Candle>,
    pub error: Option<String>,
    pub requests: Mutex<Vec<(String, String, usize)>>,
}

impl MockHistoryPort {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            error: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            candles: Vec::new(),
            error: Some(reason.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl HistoryPort for MockHistoryPort {
    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, TraderError> {
        self.requests
            .lock()
            .push((symbol.to_string(), interval.to_string(), limit));
        if let Some(reason) = &self.error {
            return Err(TraderError::data_source("mock", reason));
        }
        let skip = self.candles.len().saturating_sub(limit);
        Ok(self.candles[skip..].to_vec())
    }
}

/// Test handle for pushing payloads into a connected [`MockStreamPort`].
/// Dropping it ends the stream as a remote close would.
pub type StreamFeeder = mpsc::UnboundedSender<Result<String, TraderError>>;

/// A stream port whose single connection is fed by the test.
pub struct MockStreamPort {
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Result<String, TraderError>>>>,
    refuse: bool,
}

impl MockStreamPort {
    pub fn new() -> (Self, StreamFeeder) {
        let (tx, rx) = mpsc::unbounded_channel();
        let port = Self {
            receiver: Mutex::new(Some(rx)),
            refuse: false,
        };
        (port, tx)
    }

    pub fn refusing() -> Self {
        Self {
            receiver: Mutex::new(None),
            refuse: true,
        }
    }
}

#[async_trait]
impl StreamPort for MockStreamPort {
    async fn connect(&self, _symbol: &str, _interval: &str) -> Result<KlineStream, TraderError> {
        if self.refuse {
            return Err(TraderError::data_source("mock", "connection refused"));
        }
        let rx = self
            .receiver
            .lock()
            .take()
            .ok_or_else(|| TraderError::data_source("mock", "already connected"))?;
        Ok(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .boxed())
    }
}
