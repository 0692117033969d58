//! klinetrader: live kline collection, indicator signals and backtesting.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. The live stream session lives in
//! [`feed`] and background model training in [`training`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod feed;
pub mod ports;
pub mod training;
