//! Live stream session: historical seed, push-stream consumer and kline
//! decoding.

pub mod kline;
pub mod live;
pub mod seeder;

use std::time::Duration;

use crate::domain::config_validation::{StreamConfig, DEFAULT_TIMEOUT_SECS};
use crate::domain::error::TraderError;

pub use live::LiveFeed;
pub use seeder::{HistoricalSeeder, SeedStatus};

/// What one stream session binds to and how much history it keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    pub symbol: String,
    pub interval: String,
    pub capacity: usize,
    pub seed_limit: usize,
    pub seed_timeout: Duration,
}

impl StreamSettings {
    pub fn new(
        symbol: impl Into<String>,
        interval: impl Into<String>,
        capacity: usize,
        seed_limit: usize,
    ) -> Result<Self, TraderError> {
        let symbol = symbol.into().trim().to_uppercase();
        let interval = interval.into().trim().to_string();
        if symbol.is_empty() {
            return Err(TraderError::config_invalid(
                "stream",
                "symbol",
                "symbol must not be empty",
            ));
        }
        if interval.is_empty() {
            return Err(TraderError::config_invalid(
                "stream",
                "interval",
                "interval must not be empty",
            ));
        }
        if capacity == 0 {
            return Err(TraderError::config_invalid(
                "stream",
                "capacity",
                "capacity must be at least 1",
            ));
        }
        if seed_limit == 0 {
            return Err(TraderError::config_invalid(
                "stream",
                "seed_limit",
                "seed_limit must be at least 1",
            ));
        }
        Ok(StreamSettings {
            symbol,
            interval,
            capacity,
            seed_limit,
            seed_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_seed_timeout(mut self, timeout: Duration) -> Self {
        self.seed_timeout = timeout;
        self
    }

    pub fn from_config(config: &StreamConfig) -> Result<Self, TraderError> {
        Ok(Self::new(
            config.symbol.as_str(),
            config.interval.as_str(),
            config.capacity,
            config.seed_limit,
        )?
        .with_seed_timeout(Duration::from_secs(config.timeout_secs)))
    }
}
