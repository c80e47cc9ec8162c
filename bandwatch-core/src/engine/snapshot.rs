//! Indicator engine: full recomputation of the latest indicator snapshot.
//!
//! Every refresh recomputes all series from the window contents; nothing is
//! carried between calls, so two windows with identical bars always produce
//! identical snapshots.

use serde::{Deserialize, Serialize};

use crate::components::indicator::Indicator;
use crate::domain::{Bar, PriceWindow};
use crate::indicators::{directional_series, Bollinger, Rsi, Sma, StdDev};

/// Indicator values attached to the latest bar. `None` means indeterminate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub sma20: Option<f64>,
    pub stddev20: Option<f64>,
    pub upper_band: Option<f64>,
    pub lower_band: Option<f64>,
    pub sma9: Option<f64>,
    pub sma21: Option<f64>,
    pub rsi14: Option<f64>,
    pub tr: Option<f64>,
    pub dm_plus: Option<f64>,
    pub dm_minus: Option<f64>,
    pub di_plus14: Option<f64>,
    pub di_minus14: Option<f64>,
    pub dx: Option<f64>,
    pub adx14: Option<f64>,
}

/// Computes `IndicatorSnapshot`s with the fixed parameter set
/// (Bollinger 20/2, SMA 9/21, RSI 14, directional span 14).
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    sma20: Sma,
    stddev20: StdDev,
    upper: Bollinger,
    lower: Bollinger,
    sma9: Sma,
    sma21: Sma,
    rsi14: Rsi,
    directional_span: usize,
}

impl IndicatorEngine {
    pub const BAND_PERIOD: usize = 20;
    pub const BAND_MULTIPLIER: f64 = 2.0;
    pub const RSI_PERIOD: usize = 14;
    pub const DIRECTIONAL_SPAN: usize = 14;

    pub fn new() -> Self {
        Self {
            sma20: Sma::new(Self::BAND_PERIOD),
            stddev20: StdDev::new(Self::BAND_PERIOD),
            upper: Bollinger::upper(Self::BAND_PERIOD, Self::BAND_MULTIPLIER),
            lower: Bollinger::lower(Self::BAND_PERIOD, Self::BAND_MULTIPLIER),
            sma9: Sma::new(9),
            sma21: Sma::new(21),
            rsi14: Rsi::new(Self::RSI_PERIOD),
            directional_span: Self::DIRECTIONAL_SPAN,
        }
    }

    /// Recompute the snapshot for the latest bar of `window`.
    pub fn compute(&self, window: &PriceWindow) -> IndicatorSnapshot {
        self.compute_bars(window.bars())
    }

    /// Same as [`compute`](Self::compute) over a raw bar slice.
    pub fn compute_bars(&self, bars: &[Bar]) -> IndicatorSnapshot {
        let directional = directional_series(bars, self.directional_span);
        let last = |series: &[Option<f64>]| series.last().copied().flatten();

        IndicatorSnapshot {
            sma20: self.sma20.latest(bars),
            stddev20: self.stddev20.latest(bars),
            upper_band: self.upper.latest(bars),
            lower_band: self.lower.latest(bars),
            sma9: self.sma9.latest(bars),
            sma21: self.sma21.latest(bars),
            rsi14: self.rsi14.latest(bars),
            tr: last(&directional.tr),
            dm_plus: last(&directional.dm_plus),
            dm_minus: last(&directional.dm_minus),
            di_plus14: last(&directional.di_plus),
            di_minus14: last(&directional.di_minus),
            dx: last(&directional.dx),
            adx14: last(&directional.adx),
        }
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new()
    }
}
