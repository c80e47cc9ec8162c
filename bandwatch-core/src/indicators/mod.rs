//! Concrete indicator implementations.
//!
//! Single-series indicators implement the `Indicator` trait from
//! `components::indicator`. The directional family (TR, DM, DI, DX, ADX) shares
//! its intermediates, so it is also exposed as one `DirectionalSeries`.
//!
//! Multi-series indicators (Bollinger) are exposed as separate named instances
//! per band, keeping the single-series `Indicator` trait unchanged.

pub mod adx;
pub mod bollinger;
pub mod ewm;
pub mod rsi;
pub mod sma;

pub use adx::{directional_series, Adx, DirectionalSeries};
pub use bollinger::{Bollinger, BollingerBand, StdDev};
pub use ewm::ewm_of_series;
pub use rsi::Rsi;
pub use sma::Sma;

/// `Some(v)` for a finite value. Overflowed arithmetic is indeterminate.
pub fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Create synthetic 1-minute bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1.0.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            crate::domain::Bar {
                timestamp: i as i64 * 60_000,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1.0,
            }
        })
        .collect()
}

/// Create 1-minute bars from explicit (open, high, low, close) tuples.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::Bar> {
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| crate::domain::Bar {
            timestamp: i as i64 * 60_000,
            open,
            high,
            low,
            close,
            volume: 1.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
