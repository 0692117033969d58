//! Kline payload decoding for the push stream and the REST history
//! endpoint.

use serde_json::Value;

use crate::domain::candle::Candle;
use crate::domain::error::TraderError;

/// Decode one stream message.
///
/// Messages without a `"k"` object (subscription acks, pongs) yield
/// `Ok(None)`. A `"k"` object with missing keys or unparseable numbers is
/// `MalformedInput`.
pub fn parse_stream_message(text: &str) -> Result<Option<Candle>, TraderError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| TraderError::malformed(format!("invalid JSON message: {e}")))?;

    let Some(k) = value.get("k") else {
        return Ok(None);
    };
    if !k.is_object() {
        return Err(TraderError::malformed("kline field \"k\" is not an object"));
    }

    let open_time = k
        .get("t")
        .and_then(Value::as_i64)
        .ok_or_else(|| TraderError::malformed("kline missing integer open time \"t\""))?;
    let is_closed = k
        .get("x")
        .and_then(Value::as_bool)
        .ok_or_else(|| TraderError::malformed("kline missing closed flag \"x\""))?;

    let candle = Candle {
        timestamp: open_time.div_euclid(1000),
        open: number_field(k, "o")?,
        high: number_field(k, "h")?,
        low: number_field(k, "l")?,
        close: number_field(k, "c")?,
        volume: number_field(k, "v")?,
        is_closed,
    };
    candle.validate()?;
    Ok(Some(candle))
}

/// Decode a REST klines body: an array of
/// `[open_time_ms, "open", "high", "low", "close", "volume", close_time_ms, ...]`
/// rows. A row whose close time is not before `now_ms` is the bar still
/// forming; rows without a close time count as closed. One bad row rejects
/// the whole body.
pub fn parse_rest_rows(body: &Value, now_ms: i64) -> Result<Vec<Candle>, TraderError> {
    let rows = body
        .as_array()
        .ok_or_else(|| TraderError::malformed("klines response is not an array"))?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| parse_rest_row(row, now_ms).map_err(|e| row_error(i, e)))
        .collect()
}

fn parse_rest_row(row: &Value, now_ms: i64) -> Result<Candle, TraderError> {
    let cells = row
        .as_array()
        .filter(|cells| cells.len() >= 6)
        .ok_or_else(|| TraderError::malformed("expected an array of at least 6 fields"))?;

    let open_time = cells[0]
        .as_i64()
        .ok_or_else(|| TraderError::malformed("open time is not an integer"))?;
    let is_closed = match cells.get(6) {
        None => true,
        Some(cell) => {
            let close_time = cell
                .as_i64()
                .ok_or_else(|| TraderError::malformed("close time is not an integer"))?;
            close_time < now_ms
        }
    };

    let candle = Candle {
        timestamp: open_time.div_euclid(1000),
        open: as_number(&cells[1], "open")?,
        high: as_number(&cells[2], "high")?,
        low: as_number(&cells[3], "low")?,
        close: as_number(&cells[4], "close")?,
        volume: as_number(&cells[5], "volume")?,
        is_closed,
    };
    candle.validate()?;
    Ok(candle)
}

fn row_error(index: usize, err: TraderError) -> TraderError {
    match err {
        TraderError::MalformedInput { reason } => {
            TraderError::malformed(format!("kline row {index}: {reason}"))
        }
        other => other,
    }
}

fn number_field(obj: &Value, key: &str) -> Result<f64, TraderError> {
    let value = obj
        .get(key)
        .ok_or_else(|| TraderError::malformed(format!("kline missing \"{key}\"")))?;
    as_number(value, key)
}

/// Exchange payloads carry decimals as strings; accept plain numbers too.
fn as_number(value: &Value, name: &str) -> Result<f64, TraderError> {
    match value {
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|_| TraderError::malformed(format!("{name} is not a number: {s:?}"))),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| TraderError::malformed(format!("{name} is out of range"))),
        other => Err(TraderError::malformed(format!(
            "{name} has unexpected type: {other}"
        ))),
    }
}
