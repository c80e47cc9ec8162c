//! Periodic summary reports, debounced by wall-clock interval.
//!
//! `SummaryScheduler` is the single writer of `last_emitted_at`. A scheduler
//! that has never emitted emits on its first call, so a fresh monitor reports
//! immediately at start-up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

use crate::domain::PriceWindow;
use crate::engine::IndicatorSnapshot;
use crate::indicators::finite;

/// Default spacing between summaries.
pub const DEFAULT_EMIT_INTERVAL: Duration = Duration::from_secs(300);

/// Bars used for the short-horizon mean.
pub const MEAN_BARS: usize = 30;

/// Bars spanned by the 24-hour change (1-minute bars).
pub const DAY_BARS: usize = 1440;

/// 24-hour change: either a computed value (possibly indeterminate) or not
/// enough history to attempt it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeWindow {
    Value(Option<f64>),
    Insufficient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub last_close: Option<f64>,
    pub mean_30: Option<f64>,
    pub rsi14: Option<f64>,
    pub adx14: Option<f64>,
    pub upper_band: Option<f64>,
    pub lower_band: Option<f64>,
    pub change_1m: Option<f64>,
    pub change_24h: ChangeWindow,
}

impl SummaryReport {
    /// Build a report from the current window and snapshot.
    pub fn build(
        symbol: &str,
        now: DateTime<Utc>,
        window: &PriceWindow,
        snapshot: &IndicatorSnapshot,
    ) -> Self {
        let last_close = window.close_at(0);
        let tail = window.tail_closes(MEAN_BARS);
        let mean_30 = (!tail.is_empty())
            .then(|| tail.iter().sum::<f64>() / tail.len() as f64)
            .and_then(finite);

        let change_1m = percent_change(last_close, window.close_at(1));
        let change_24h = if window.len() >= DAY_BARS {
            ChangeWindow::Value(percent_change(last_close, window.close_at(DAY_BARS - 1)))
        } else {
            ChangeWindow::Insufficient
        };

        Self {
            symbol: symbol.to_string(),
            generated_at: now,
            last_close,
            mean_30,
            rsi14: snapshot.rsi14,
            adx14: snapshot.adx14,
            upper_band: snapshot.upper_band,
            lower_band: snapshot.lower_band,
            change_1m,
            change_24h,
        }
    }

    /// Multi-line alert text. Numbers use two decimals; indeterminate values
    /// print as `n/a`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Summary {}:", self.symbol);
        let _ = writeln!(out, "Current Price: {}", money(self.last_close));
        let _ = writeln!(out, "Mean (last 30 min): {}", money(self.mean_30));
        let _ = writeln!(out, "RSI: {}", plain(self.rsi14));
        let _ = writeln!(out, "ADX: {}", plain(self.adx14));
        let _ = writeln!(out, "Upper Band: {}", money(self.upper_band));
        let _ = writeln!(out, "Lower Band: {}", money(self.lower_band));
        let _ = writeln!(out, "1m Change: {}", percent(self.change_1m));
        let day = match self.change_24h {
            ChangeWindow::Value(v) => percent(v),
            ChangeWindow::Insufficient => "insufficient data".to_string(),
        };
        let _ = writeln!(out, "24h Change: {day}");
        out
    }
}

fn percent_change(current: Option<f64>, prior: Option<f64>) -> Option<f64> {
    let (current, prior) = (current?, prior?);
    if prior == 0.0 {
        return None;
    }
    finite((current - prior) / prior * 100.0)
}

fn money(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("${v:.2}"))
}

fn plain(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn percent(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}%"))
}

#[derive(Debug, Clone)]
pub struct SummaryScheduler {
    symbol: String,
    emit_interval: Duration,
    last_emitted_at: Option<DateTime<Utc>>,
}

impl SummaryScheduler {
    pub fn new(symbol: impl Into<String>, emit_interval: Duration) -> Self {
        Self {
            symbol: symbol.into(),
            emit_interval,
            last_emitted_at: None,
        }
    }

    pub fn last_emitted_at(&self) -> Option<DateTime<Utc>> {
        self.last_emitted_at
    }

    pub fn emit_interval(&self) -> Duration {
        self.emit_interval
    }

    /// True when a summary would be emitted at `now`.
    ///
    /// A clock that moved backwards since the last emission never qualifies.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_emitted_at {
            None => true,
            Some(last) => now
                .signed_duration_since(last)
                .to_std()
                .map(|elapsed| elapsed >= self.emit_interval)
                .unwrap_or(false),
        }
    }

    /// Emit a report and reset the timer if the interval has elapsed.
    pub fn maybe_emit(
        &mut self,
        now: DateTime<Utc>,
        window: &PriceWindow,
        snapshot: &IndicatorSnapshot,
    ) -> Option<SummaryReport> {
        if !self.is_due(now) {
            return None;
        }
        self.last_emitted_at = Some(now);
        Some(SummaryReport::build(&self.symbol, now, window, snapshot))
    }
}
