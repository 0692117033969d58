//! Long-lived push-stream consumer for one symbol+interval.
//!
//! `start` seeds the store from history and then spawns the receive loop on
//! its own task. The loop applies every decoded kline to the store, drops
//! malformed payloads, and ends for good on transport error or close. It
//! never reconnects; whoever owns the handle decides whether to restart.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::kline::parse_stream_message;
use super::seeder::{HistoricalSeeder, SeedStatus};
use super::StreamSettings;
use crate::domain::candle_store::CandleStore;
use crate::domain::error::TraderError;
use crate::ports::history_port::HistoryPort;
use crate::ports::stream_port::StreamPort;

/// How long `join` waits for the loop before aborting it.
pub const JOIN_GRACE: Duration = Duration::from_secs(2);

pub struct LiveFeed {
    store: Arc<CandleStore>,
    running: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl LiveFeed {
    /// Seed synchronously, then spawn the receive loop.
    ///
    /// A failed seed is reported through the returned status and the loop
    /// still starts on an empty store.
    pub async fn start(
        settings: StreamSettings,
        history: &dyn HistoryPort,
        stream: Arc<dyn StreamPort>,
    ) -> Result<(LiveFeed, SeedStatus), TraderError> {
        let store = Arc::new(CandleStore::with_capacity(
            settings.symbol.as_str(),
            settings.interval.as_str(),
            settings.capacity,
        )?);

        let status = HistoricalSeeder::new(settings.seed_timeout)
            .seed(&store, history, settings.seed_limit)
            .await;

        let running = Arc::new(AtomicBool::new(true));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(receive_loop(
            Arc::clone(&store),
            stream,
            shutdown_rx,
            Arc::clone(&running),
        ));

        info!(
            symbol = %settings.symbol,
            interval = %settings.interval,
            seed = %status,
            "live feed started"
        );

        let feed = LiveFeed {
            store,
            running,
            shutdown,
            task: Some(task),
        };
        Ok((feed, status))
    }

    pub fn store(&self) -> Arc<CandleStore> {
        Arc::clone(&self.store)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal the loop to drop its connection and exit. Safe to call any
    /// number of times from any thread; returns immediately.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.send_replace(true);
    }

    /// Wait for the loop to finish, aborting it after [`JOIN_GRACE`].
    pub async fn join(mut self) {
        let Some(mut task) = self.task.take() else {
            return;
        };
        if tokio::time::timeout(JOIN_GRACE, &mut task).await.is_err() {
            warn!(symbol = %self.store.symbol(), "live loop did not exit in time, aborting");
            task.abort();
        }
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn receive_loop(
    store: Arc<CandleStore>,
    stream: Arc<dyn StreamPort>,
    mut shutdown: watch::Receiver<bool>,
    running: Arc<AtomicBool>,
) {
    let symbol = store.symbol().to_string();
    let interval = store.interval().to_string();

    let connected = tokio::select! {
        biased;
        _ = shutdown.changed() => {
            running.store(false, Ordering::SeqCst);
            return;
        }
        result = stream.connect(&symbol, &interval) => result,
    };

    let mut messages = match connected {
        Ok(messages) => messages,
        Err(e) => {
            warn!(%symbol, %interval, error = %e, "stream connect failed");
            running.store(false, Ordering::SeqCst);
            return;
        }
    };
    debug!(%symbol, %interval, "stream connected");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                info!(%symbol, %interval, "live feed stopped");
                break;
            }
            next = messages.next() => match next {
                Some(Ok(text)) => handle_message(&store, &text),
                Some(Err(e)) => {
                    warn!(%symbol, %interval, error = %e, "stream error, not reconnecting");
                    break;
                }
                None => {
                    info!(%symbol, %interval, "stream closed by remote");
                    break;
                }
            },
        }
    }

    running.store(false, Ordering::SeqCst);
}

fn handle_message(store: &CandleStore, text: &str) {
    match parse_stream_message(text) {
        Ok(Some(candle)) => match store.apply(candle) {
            Ok(outcome) => debug!(timestamp = candle.timestamp, ?outcome, "kline applied"),
            Err(e) => warn!(error = %e, "dropped kline"),
        },
        Ok(None) => debug!("ignored non-kline message"),
        Err(e) => warn!(error = %e, "dropped malformed message"),
    }
}
