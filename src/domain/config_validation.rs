//! Configuration loading and validation.
//!
//! Every key is optional and falls back to its default, but a key that is
//! present must parse and pass its range check. Nothing is clamped.

use std::str::FromStr;

use crate::domain::backtest::{
    BacktestConfig, DEFAULT_FEE, DEFAULT_INITIAL_BALANCE, DEFAULT_SLIPPAGE,
};
use crate::domain::candle_store::DEFAULT_CAPACITY;
use crate::domain::error::TraderError;
use crate::domain::indicator::IndicatorParams;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_SYMBOL: &str = "BTCUSDT";
pub const DEFAULT_INTERVAL: &str = "1m";
pub const DEFAULT_REST_URL: &str = "https://api.binance.com";
pub const DEFAULT_WS_URL: &str = "wss://stream.binance.com:9443";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection and window settings for one live stream session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    pub symbol: String,
    pub interval: String,
    pub capacity: usize,
    pub seed_limit: usize,
    pub rest_url: String,
    pub ws_url: String,
    pub timeout_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            symbol: DEFAULT_SYMBOL.to_string(),
            interval: DEFAULT_INTERVAL.to_string(),
            capacity: DEFAULT_CAPACITY,
            seed_limit: DEFAULT_CAPACITY,
            rest_url: DEFAULT_REST_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppConfig {
    pub stream: StreamConfig,
    pub indicators: IndicatorParams,
    pub backtest: BacktestConfig,
}

pub fn load_app_config(config: &dyn ConfigPort) -> Result<AppConfig, TraderError> {
    Ok(AppConfig {
        stream: load_stream_config(config)?,
        indicators: load_indicator_params(config)?,
        backtest: load_backtest_config(config)?,
    })
}

pub fn load_stream_config(config: &dyn ConfigPort) -> Result<StreamConfig, TraderError> {
    let defaults = StreamConfig::default();

    let symbol = non_empty(config, "stream", "symbol")?
        .map(|s| s.to_uppercase())
        .unwrap_or(defaults.symbol);
    let interval = non_empty(config, "stream", "interval")?.unwrap_or(defaults.interval);

    let capacity = parse_or(config, "stream", "capacity", defaults.capacity)?;
    if capacity == 0 {
        return Err(TraderError::config_invalid(
            "stream",
            "capacity",
            "capacity must be at least 1",
        ));
    }

    let seed_limit = parse_or(config, "stream", "seed_limit", capacity)?;
    if seed_limit == 0 {
        return Err(TraderError::config_invalid(
            "stream",
            "seed_limit",
            "seed_limit must be at least 1",
        ));
    }

    let rest_url = non_empty(config, "stream", "rest_url")?.unwrap_or(defaults.rest_url);
    let ws_url = non_empty(config, "stream", "ws_url")?.unwrap_or(defaults.ws_url);

    let timeout_secs = parse_or(config, "stream", "timeout_secs", defaults.timeout_secs)?;
    if timeout_secs == 0 {
        return Err(TraderError::config_invalid(
            "stream",
            "timeout_secs",
            "timeout_secs must be at least 1",
        ));
    }

    Ok(StreamConfig {
        symbol,
        interval,
        capacity,
        seed_limit,
        rest_url: rest_url.trim_end_matches('/').to_string(),
        ws_url: ws_url.trim_end_matches('/').to_string(),
        timeout_secs,
    })
}

pub fn load_indicator_params(config: &dyn ConfigPort) -> Result<IndicatorParams, TraderError> {
    let d = IndicatorParams::default();
    IndicatorParams::new(
        parse_or(config, "indicators", "ema_short", d.ema_short())?,
        parse_or(config, "indicators", "ema_long", d.ema_long())?,
        parse_or(config, "indicators", "sma", d.sma())?,
        parse_or(config, "indicators", "rsi", d.rsi())?,
        parse_or(config, "indicators", "atr", d.atr())?,
        parse_or(config, "indicators", "volume_window", d.volume_window())?,
    )
}

pub fn load_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TraderError> {
    let initial_balance = parse_or(
        config,
        "backtest",
        "initial_balance",
        DEFAULT_INITIAL_BALANCE,
    )?;
    let fee = parse_or(config, "backtest", "fee", DEFAULT_FEE)?;
    let slippage = parse_or(config, "backtest", "slippage", DEFAULT_SLIPPAGE)?;
    BacktestConfig::new(initial_balance, fee, slippage)
}

fn non_empty(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<String>, TraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Err(TraderError::config_invalid(
            section,
            key,
            format!("{key} must not be empty"),
        )),
        Some(s) => Ok(Some(s.trim().to_string())),
    }
}

fn parse_or<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, TraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            TraderError::config_invalid(section, key, format!("cannot parse '{}'", raw.trim()))
        }),
    }
}
