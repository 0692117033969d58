//! Supervised dataset construction for an external classifier.
//!
//! Features come from the indicator pipeline; the label marks whether the
//! next feature row closes higher than the current one. The final row has
//! no successor and is dropped.

use std::io::Write;

use super::candle::Candle;
use super::error::TraderError;
use super::indicator::IndicatorParams;
use super::pipeline::{compute_features, FeatureRow};

pub const FEATURE_COLUMNS: [&str; 9] = [
    "close",
    "ema_short",
    "ema_long",
    "rsi",
    "atr",
    "ret_1",
    "ret_3",
    "vol_rolling",
    "sma50",
];

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRow {
    pub timestamp: i64,
    pub features: [f64; 9],
    pub label: u8,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<LabeledRow>,
}

/// One feature row in [`FEATURE_COLUMNS`] order.
pub fn feature_vector(row: &FeatureRow) -> [f64; 9] {
    [
        row.candle.close,
        row.ema_short,
        row.ema_long,
        row.rsi,
        row.atr,
        row.ret_1,
        row.ret_3,
        row.vol_rolling,
        row.sma50,
    ]
}

pub fn build_dataset(candles: &[Candle], params: &IndicatorParams) -> Dataset {
    let features = compute_features(candles, params);
    let rows = features
        .windows(2)
        .map(|pair| LabeledRow {
            timestamp: pair[0].candle.timestamp,
            features: feature_vector(&pair[0]),
            label: u8::from(pair[1].candle.close > pair[0].candle.close),
        })
        .collect();
    Dataset { rows }
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[LabeledRow] {
        &self.rows
    }

    pub fn features(&self) -> Vec<[f64; 9]> {
        self.rows.iter().map(|r| r.features).collect()
    }

    pub fn labels(&self) -> Vec<u8> {
        self.rows.iter().map(|r| r.label).collect()
    }

    /// Write `timestamp,<FEATURE_COLUMNS>,target` CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TraderError> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec!["timestamp"];
        header.extend(FEATURE_COLUMNS);
        header.push("target");
        wtr.write_record(&header).map_err(csv_error)?;

        for row in &self.rows {
            let mut record = Vec::with_capacity(FEATURE_COLUMNS.len() + 2);
            record.push(row.timestamp.to_string());
            record.extend(row.features.iter().map(|v| v.to_string()));
            record.push(row.label.to_string());
            wtr.write_record(&record).map_err(csv_error)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

fn csv_error(err: csv::Error) -> TraderError {
    match err.into_kind() {
        csv::ErrorKind::Io(io) => TraderError::Io(io),
        other => TraderError::malformed(format!("CSV write error: {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zigzag(count: usize) -> Vec<Candle> {
        (0..count)
            .map(|i| {
                let close = 100.0 + i as f64 * 0.2 + if i % 2 == 0 { 1.0 } else { -1.0 };
                Candle {
                    timestamp: i as i64 * 60,
                    open: close,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 5.0,
                    is_closed: true,
                }
            })
            .collect()
    }

    #[test]
    fn drops_last_feature_row() {
        let candles = zigzag(100);
        let features = compute_features(&candles, &IndicatorParams::default());
        let dataset = build_dataset(&candles, &IndicatorParams::default());
        assert_eq!(dataset.len(), features.len() - 1);
    }

    #[test]
    fn label_is_next_close_higher() {
        let dataset = build_dataset(&zigzag(80), &IndicatorParams::default());
        // zigzag alternates: even bars are local highs
        for row in dataset.rows() {
            let bar = row.timestamp / 60;
            let expected = if bar % 2 == 0 { 0 } else { 1 };
            assert_eq!(row.label, expected, "bar {bar}");
        }
    }

    #[test]
    fn feature_order_matches_columns() {
        let candles = zigzag(70);
        let features = compute_features(&candles, &IndicatorParams::default());
        let dataset = build_dataset(&candles, &IndicatorParams::default());
        let first = &dataset.rows()[0];
        assert_eq!(first.features[0], features[0].candle.close);
        assert_eq!(first.features[3], features[0].rsi);
        assert_eq!(first.features[8], features[0].sma50);
    }

    #[test]
    fn insufficient_history_is_empty() {
        assert!(build_dataset(&zigzag(50), &IndicatorParams::default()).is_empty());
    }

    #[test]
    fn csv_has_header_and_rows() {
        let dataset = build_dataset(&zigzag(60), &IndicatorParams::default());
        let mut buf = Vec::new();
        dataset.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,close,ema_short,ema_long,rsi,atr,ret_1,ret_3,vol_rolling,sma50,target"
        );
        assert_eq!(lines.count(), dataset.len());
    }
}
