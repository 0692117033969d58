//! Binance REST klines as a [`HistoryPort`].

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::domain::candle::Candle;
use crate::domain::error::TraderError;
use crate::feed::kline::parse_rest_rows;
use crate::ports::history_port::HistoryPort;

const SOURCE: &str = "binance-rest";

/// Largest `limit` the klines endpoint accepts.
pub const MAX_LIMIT: usize = 1000;

pub struct BinanceRestAdapter {
    client: Client,
    base_url: String,
}

impl BinanceRestAdapter {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TraderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TraderError::data_source(SOURCE, e))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn klines_url(&self) -> String {
        format!("{}/api/v3/klines", self.base_url)
    }
}

#[async_trait]
impl HistoryPort for BinanceRestAdapter {
    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, TraderError> {
        let symbol = symbol.to_uppercase();
        let limit = limit.clamp(1, MAX_LIMIT);
        debug!(%symbol, interval, limit, "fetching klines");

        let response = self
            .client
            .get(self.klines_url())
            .query(&[
                ("symbol", symbol.as_str()),
                ("interval", interval),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| TraderError::data_source(SOURCE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TraderError::data_source(
                SOURCE,
                format!("HTTP {status}: {body}"),
            ));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TraderError::data_source(SOURCE, e))?;

        let mut candles = parse_rest_rows(&body, Utc::now().timestamp_millis())?;
        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }
}
