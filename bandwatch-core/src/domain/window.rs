//! PriceWindow: bounded, strictly time-ordered buffer of bars.
//!
//! The window is the sole data substrate of the engine. Indicators, the trend
//! predictor and the summary scheduler all read from it; only the monitor
//! mutates it.

use super::bar::Bar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default capacity: 24 hours of 1-minute bars.
pub const DEFAULT_CAPACITY: usize = 1440;

/// Reasons a bar is refused at the window boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WindowError {
    #[error("out-of-order bar: timestamp {timestamp} is not after latest {latest}")]
    OutOfOrder { timestamp: i64, latest: i64 },

    #[error("invalid bar at {timestamp}: OHLCV fails sanity check")]
    InvalidBar { timestamp: i64 },

    #[error("window capacity must be >= 1")]
    ZeroCapacity,
}

/// Outcome of feeding a batch of bars into the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Bars appended to the window.
    pub appended: usize,
    /// Bars at or before the latest timestamp (overlap of a re-fetch).
    pub skipped: usize,
    /// Bars refused by the sanity check.
    pub rejected: usize,
}

#[derive(Debug, Clone)]
pub struct PriceWindow {
    bars: Vec<Bar>,
    capacity: usize,
}

impl PriceWindow {
    pub fn new(capacity: usize) -> Result<Self, WindowError> {
        if capacity == 0 {
            return Err(WindowError::ZeroCapacity);
        }
        Ok(Self {
            bars: Vec::with_capacity(capacity),
            capacity,
        })
    }

    /// Append a bar at the end, evicting the oldest bar when over capacity.
    ///
    /// The window is left untouched when the bar is rejected.
    pub fn append(&mut self, bar: Bar) -> Result<(), WindowError> {
        if let Some(last) = self.bars.last() {
            if bar.timestamp <= last.timestamp {
                return Err(WindowError::OutOfOrder {
                    timestamp: bar.timestamp,
                    latest: last.timestamp,
                });
            }
        }
        if !bar.is_sane() {
            return Err(WindowError::InvalidBar {
                timestamp: bar.timestamp,
            });
        }

        self.bars.push(bar);
        if self.bars.len() > self.capacity {
            let excess = self.bars.len() - self.capacity;
            self.bars.drain(..excess);
        }
        Ok(())
    }

    /// Append every bar newer than the current latest.
    ///
    /// A re-fetched window overlaps the bars already held; those are counted as
    /// skipped rather than treated as errors.
    pub fn extend<I>(&mut self, bars: I) -> IngestReport
    where
        I: IntoIterator<Item = Bar>,
    {
        let mut report = IngestReport::default();
        for bar in bars {
            match self.append(bar) {
                Ok(()) => report.appended += 1,
                Err(WindowError::OutOfOrder { .. }) => report.skipped += 1,
                Err(_) => report.rejected += 1,
            }
        }
        report
    }

    /// Last `n` closes in chronological order (fewer if the window is shorter).
    pub fn tail_closes(&self, n: usize) -> Vec<f64> {
        let start = self.bars.len().saturating_sub(n);
        self.bars[start..].iter().map(|b| b.close).collect()
    }

    /// Close `offset_from_end` bars before the latest (0 = latest).
    pub fn close_at(&self, offset_from_end: usize) -> Option<f64> {
        let len = self.bars.len();
        if offset_from_end >= len {
            return None;
        }
        Some(self.bars[len - 1 - offset_from_end].close)
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// All bars, oldest first.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for PriceWindow {
    fn default() -> Self {
        Self {
            bars: Vec::with_capacity(DEFAULT_CAPACITY),
            capacity: DEFAULT_CAPACITY,
        }
    }
}
