//! Market data retrieval

pub mod binance;
pub mod circuit_breaker;
pub mod provider;

pub use binance::BinanceProvider;
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use provider::{DataError, DataSource, FetchResult, MarketDataProvider};
