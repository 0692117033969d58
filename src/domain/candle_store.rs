//! Bounded, time-ordered candle window for one symbol+interval stream.
//!
//! The store is shared between the live receive loop (writer) and any number
//! of readers. A single mutex guards the window; it is held only while a
//! candle is written or the window is copied, never across I/O.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::candle::Candle;
use super::error::TraderError;

pub const DEFAULT_CAPACITY: usize = 1200;

/// What `apply` did with an incoming candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Same timestamp as the newest stored candle: the forming bar was updated.
    Replaced,
    /// Any other timestamp: appended, evicting the oldest candle at capacity.
    Appended,
}

#[derive(Debug)]
pub struct CandleStore {
    symbol: String,
    interval: String,
    capacity: usize,
    candles: Mutex<VecDeque<Candle>>,
}

impl CandleStore {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>) -> Self {
        CandleStore {
            symbol: symbol.into(),
            interval: interval.into(),
            capacity: DEFAULT_CAPACITY,
            candles: Mutex::new(VecDeque::with_capacity(DEFAULT_CAPACITY)),
        }
    }

    pub fn with_capacity(
        symbol: impl Into<String>,
        interval: impl Into<String>,
        capacity: usize,
    ) -> Result<Self, TraderError> {
        if capacity == 0 {
            return Err(TraderError::config_invalid(
                "stream",
                "capacity",
                "capacity must be at least 1",
            ));
        }
        Ok(CandleStore {
            symbol: symbol.into(),
            interval: interval.into(),
            capacity,
            candles: Mutex::new(VecDeque::with_capacity(capacity)),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored entries, counting an out-of-order duplicate append twice until
    /// [`snapshot`](Self::snapshot) collapses it. Use the snapshot length
    /// when the count must match what analysis sees.
    pub fn len(&self) -> usize {
        self.candles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.lock().is_empty()
    }

    pub fn last(&self) -> Option<Candle> {
        self.candles.lock().back().copied()
    }

    pub fn clear(&self) {
        self.candles.lock().clear();
    }

    /// Bulk-load historical candles, replacing the current contents.
    ///
    /// Input is stably sorted by timestamp and deduplicated with the last
    /// occurrence winning, then only the newest `capacity` candles are kept.
    /// If any candle is invalid nothing is written.
    pub fn seed(&self, candles: &[Candle]) -> Result<usize, TraderError> {
        for candle in candles {
            candle.validate()?;
        }

        let mut sorted = candles.to_vec();
        sorted.sort_by_key(|c| c.timestamp);

        let mut window: VecDeque<Candle> = VecDeque::with_capacity(self.capacity);
        for candle in sorted {
            match window.back_mut() {
                Some(last) if last.timestamp == candle.timestamp => *last = candle,
                _ => {
                    if window.len() == self.capacity {
                        window.pop_front();
                    }
                    window.push_back(candle);
                }
            }
        }

        let loaded = window.len();
        *self.candles.lock() = window;
        Ok(loaded)
    }

    /// Replace-or-append a single live update.
    ///
    /// A timestamp equal to the newest stored candle replaces it; anything
    /// else is appended as-is, including timestamps older than the newest.
    pub fn apply(&self, candle: Candle) -> Result<ApplyOutcome, TraderError> {
        candle.validate()?;

        let mut candles = self.candles.lock();
        if let Some(last) = candles.back_mut() {
            if last.timestamp == candle.timestamp {
                *last = candle;
                return Ok(ApplyOutcome::Replaced);
            }
        }
        if candles.len() == self.capacity {
            candles.pop_front();
        }
        candles.push_back(candle);
        Ok(ApplyOutcome::Appended)
    }

    /// Immutable copy of the window, sorted by timestamp with strictly
    /// increasing keys. Out-of-order live appends are placed in order and a
    /// duplicated timestamp keeps the most recently written candle.
    pub fn snapshot(&self) -> Vec<Candle> {
        let copy: Vec<Candle> = self.candles.lock().iter().copied().collect();
        normalize(copy)
    }
}

fn normalize(mut candles: Vec<Candle>) -> Vec<Candle> {
    candles.sort_by_key(|c| c.timestamp);
    let mut out: Vec<Candle> = Vec::with_capacity(candles.len());
    for candle in candles {
        match out.last_mut() {
            Some(last) if last.timestamp == candle.timestamp => *last = candle,
            _ => out.push(candle),
        }
    }
    out
}
