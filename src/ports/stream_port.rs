//! Push-based kline stream.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::error::TraderError;

/// Raw text payloads as they arrive. The stream ends when the remote side
/// closes; dropping it closes the connection.
pub type KlineStream = BoxStream<'static, Result<String, TraderError>>;

#[async_trait]
pub trait StreamPort: Send + Sync {
    async fn connect(&self, symbol: &str, interval: &str) -> Result<KlineStream, TraderError>;
}
