//! OHLCV candle representation.

use chrono::{DateTime, Utc};

use super::error::TraderError;

/// One aggregated bar of a symbol+interval stream. `timestamp` is the bar
/// open time in whole seconds and is the key within a stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub is_closed: bool,
}

impl Candle {
    /// Rejects non-finite prices/volume and negative volume.
    pub fn validate(&self) -> Result<(), TraderError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(TraderError::malformed(format!(
                    "candle {} has non-finite {name} ({value})",
                    self.timestamp
                )));
            }
        }
        if self.volume < 0.0 {
            return Err(TraderError::malformed(format!(
                "candle {} has negative volume ({})",
                self.timestamp, self.volume
            )));
        }
        Ok(())
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}
