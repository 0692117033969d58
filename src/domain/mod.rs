//! Core domain types and logic.

pub mod analysis;
pub mod backtest;
pub mod candle;
pub mod candle_store;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod labeler;
pub mod metrics;
pub mod pipeline;
pub mod position;
pub mod prediction;
pub mod signal;
