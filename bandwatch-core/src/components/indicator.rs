//! Indicator trait.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! A position whose value cannot be computed (warmup, zero denominator) is
//! `None`, never NaN and never zero.

use crate::domain::Bar;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce an output series of the same
/// length. At least the first `lookback()` values are `None`.
///
/// # Look-ahead guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator can produce a value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>>;

    /// Value at the latest bar, if determinate.
    fn latest(&self, bars: &[Bar]) -> Option<f64> {
        self.compute(bars).last().copied().flatten()
    }
}
