//! CSV candle files: `{base}/{SYMBOL}_{interval}.csv`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::domain::candle::Candle;
use crate::domain::error::TraderError;
use crate::ports::history_port::HistoryPort;

const SOURCE: &str = "csv";

#[derive(Debug, Serialize, Deserialize)]
struct CandleRecord {
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl From<&Candle> for CandleRecord {
    fn from(c: &Candle) -> Self {
        CandleRecord {
            timestamp: c.timestamp,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn csv_path(&self, symbol: &str, interval: &str) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", symbol.to_uppercase(), interval))
    }

    /// All candles in the file, sorted by timestamp. Rows are closed bars.
    pub fn load(&self, symbol: &str, interval: &str) -> Result<Vec<Candle>, TraderError> {
        let path = self.csv_path(symbol, interval);
        let file = File::open(&path).map_err(|e| {
            TraderError::data_source(SOURCE, format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(file);
        let mut candles = Vec::new();
        for (line, result) in rdr.deserialize::<CandleRecord>().enumerate() {
            let record = result.map_err(|e| {
                TraderError::malformed(format!("{} row {}: {}", path.display(), line + 1, e))
            })?;
            let candle = Candle {
                timestamp: record.timestamp,
                open: record.open,
                high: record.high,
                low: record.low,
                close: record.close,
                volume: record.volume,
                is_closed: true,
            };
            candle.validate()?;
            candles.push(candle);
        }

        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }

    /// Write candles with the same header `load` expects, replacing any
    /// existing file.
    pub fn save(
        &self,
        symbol: &str,
        interval: &str,
        candles: &[Candle],
    ) -> Result<PathBuf, TraderError> {
        fs::create_dir_all(&self.base_path)?;
        let path = self.csv_path(symbol, interval);
        write_candles(&path, candles)?;
        Ok(path)
    }
}

fn write_candles(path: &Path, candles: &[Candle]) -> Result<(), TraderError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| {
        TraderError::data_source(SOURCE, format!("failed to create {}: {}", path.display(), e))
    })?;
    for candle in candles {
        wtr.serialize(CandleRecord::from(candle)).map_err(|e| {
            TraderError::data_source(SOURCE, format!("failed to write {}: {}", path.display(), e))
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[async_trait]
impl HistoryPort for CsvAdapter {
    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, TraderError> {
        let adapter = self.clone();
        let (symbol, interval) = (symbol.to_string(), interval.to_string());
        // file reads stay off the async workers
        let mut candles = tokio::task::spawn_blocking(move || adapter.load(&symbol, &interval))
            .await
            .map_err(|e| TraderError::data_source(SOURCE, format!("read task failed: {e}")))??;
        let skip = candles.len().saturating_sub(limit);
        candles.drain(..skip);
        Ok(candles)
    }
}
