//! Bandwatch Core: rolling price window, indicators, and alert decisions.
//!
//! This crate contains everything the monitor loop needs:
//! - Domain types (bars, bar intervals, the bounded price window)
//! - Indicators (SMA, sample stddev, Bollinger bands, RSI, EWMA, directional family)
//! - Indicator snapshot engine recomputed over the whole window each cycle
//! - Decision components (band/RSI signal detector, trend predictor, summary scheduler)
//! - Market data boundary (Binance klines provider with circuit breaker)
//! - Alert boundary (log and Twilio dispatchers)
//! - Serializable monitor configuration

pub mod alert;
pub mod components;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
