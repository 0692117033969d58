//! Pull-based historical candle source.

use async_trait::async_trait;

use crate::domain::candle::Candle;
use crate::domain::error::TraderError;

#[async_trait]
pub trait HistoryPort: Send + Sync {
    /// Up to `limit` of the most recent closed candles, oldest first.
    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, TraderError>;
}
