//! Market-data provider trait and structured error types.
//!
//! The `MarketDataProvider` trait abstracts over bar sources so the monitor can
//! be driven by the live exchange or by a scripted source in tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, BarInterval};

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful fetch.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub interval: BarInterval,
    /// Closed bars, oldest first.
    pub bars: Vec<Bar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Binance,
    Scripted,
}

/// Source of recent bars for one symbol.
///
/// Implementations own retry and rate-limit policy; the monitor only sees the
/// final result.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch up to `limit` most recent closed bars, oldest first.
    fn fetch(
        &self,
        symbol: &str,
        interval: BarInterval,
        limit: usize,
    ) -> Result<FetchResult, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}
