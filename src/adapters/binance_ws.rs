//! Binance kline websocket as a [`StreamPort`].

use async_trait::async_trait;
use futures_util::{future, SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};

use crate::domain::error::TraderError;
use crate::ports::stream_port::{KlineStream, StreamPort};

const SOURCE: &str = "binance-ws";

pub struct BinanceWsAdapter {
    base_url: String,
    connect_timeout: Duration,
}

impl BinanceWsAdapter {
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            connect_timeout,
        }
    }

    pub fn stream_url(&self, symbol: &str, interval: &str) -> String {
        format!(
            "{}/ws/{}@kline_{}",
            self.base_url,
            symbol.to_lowercase(),
            interval
        )
    }
}

#[async_trait]
impl StreamPort for BinanceWsAdapter {
    async fn connect(&self, symbol: &str, interval: &str) -> Result<KlineStream, TraderError> {
        let url = self.stream_url(symbol, interval);
        let (ws, _) = tokio::time::timeout(self.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| {
                TraderError::data_source(
                    SOURCE,
                    format!("connect to {url} timed out after {:?}", self.connect_timeout),
                )
            })?
            .map_err(|e| TraderError::data_source(SOURCE, e))?;
        info!(%url, "websocket connected");

        let (mut write, read) = ws.split();
        let (pong_tx, mut pong_rx) = tokio::sync::mpsc::unbounded_channel::<Vec<u8>>();

        // Pongs go out on their own task so the reader never waits on the sink.
        tokio::spawn(async move {
            while let Some(payload) = pong_rx.recv().await {
                if write.send(Message::Pong(payload.into())).await.is_err() {
                    break;
                }
            }
            let _ = write.close().await;
        });

        let frames = read
            .take_while(|frame| future::ready(!matches!(frame, Ok(Message::Close(_)))))
            .filter_map(move |frame| {
                let item = match frame {
                    Ok(Message::Text(text)) => Some(Ok(text.to_string())),
                    Ok(Message::Ping(payload)) => {
                        debug!("ping");
                        let _ = pong_tx.send(payload.to_vec());
                        None
                    }
                    Ok(_) => None,
                    Err(e) => Some(Err(TraderError::data_source(SOURCE, e))),
                };
                future::ready(item)
            });

        Ok(frames.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_url_lowercases_symbol() {
        let adapter =
            BinanceWsAdapter::new("wss://stream.binance.com:9443/", Duration::from_secs(5));
        assert_eq!(
            adapter.stream_url("BTCUSDT", "1m"),
            "wss://stream.binance.com:9443/ws/btcusdt@kline_1m"
        );
    }

    #[tokio::test]
    async fn refused_connection_is_data_source_error() {
        let adapter = BinanceWsAdapter::new("ws://127.0.0.1:9", Duration::from_secs(2));
        let err = match adapter.connect("BTCUSDT", "1m").await {
            Ok(_) => panic!("expected connect failure"),
            Err(e) => e,
        };
        assert!(matches!(err, TraderError::DataSource { .. }));
    }
}
