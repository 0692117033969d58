//! One-shot historical bulk load of a candle store.

use std::fmt;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::candle_store::CandleStore;
use crate::ports::history_port::HistoryPort;

/// Result of a seed attempt, reported to the caller instead of an error so
/// a failed fetch never tears down the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedStatus {
    Seeded(usize),
    /// The source answered with no candles.
    Empty,
    Failed(String),
}

impl SeedStatus {
    pub fn has_data(&self) -> bool {
        matches!(self, SeedStatus::Seeded(n) if *n > 0)
    }
}

impl fmt::Display for SeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedStatus::Seeded(n) => write!(f, "seeded {n} candles"),
            SeedStatus::Empty => write!(f, "no historical data"),
            SeedStatus::Failed(reason) => write!(f, "seed failed: {reason}"),
        }
    }
}

pub struct HistoricalSeeder {
    timeout: Duration,
}

impl HistoricalSeeder {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Fetch up to `limit` closed candles for the store's symbol and
    /// interval and bulk-load them. On any failure the store is untouched.
    pub async fn seed(
        &self,
        store: &CandleStore,
        history: &dyn HistoryPort,
        limit: usize,
    ) -> SeedStatus {
        let symbol = store.symbol();
        let interval = store.interval();

        let fetched =
            tokio::time::timeout(self.timeout, history.fetch_klines(symbol, interval, limit))
                .await;

        let candles = match fetched {
            Err(_) => {
                warn!(symbol, interval, timeout = ?self.timeout, "historical fetch timed out");
                return SeedStatus::Failed(format!("timed out after {:?}", self.timeout));
            }
            Ok(Err(e)) => {
                warn!(symbol, interval, error = %e, "historical fetch failed");
                return SeedStatus::Failed(e.to_string());
            }
            Ok(Ok(candles)) => candles,
        };

        if candles.is_empty() {
            info!(symbol, interval, "historical source returned no candles");
            return SeedStatus::Empty;
        }

        match store.seed(&candles) {
            Ok(loaded) => {
                info!(symbol, interval, candles = loaded, "store seeded");
                SeedStatus::Seeded(loaded)
            }
            Err(e) => {
                warn!(symbol, interval, error = %e, "rejected historical candles");
                SeedStatus::Failed(e.to_string())
            }
        }
    }
}

impl Default for HistoricalSeeder {
    fn default() -> Self {
        Self::new(Duration::from_secs(
            crate::domain::config_validation::DEFAULT_TIMEOUT_SECS,
        ))
    }
}
