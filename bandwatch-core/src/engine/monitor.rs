//! One polling cycle: ingest → recompute → summary → signal → trend.
//!
//! `Monitor` is the single owner of the price window and the summary state.
//! Everything a cycle decides is derived from one window state, so the price
//! shown in a summary is always the price that drove the signal.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::alert::AlertDispatcher;
use crate::components::signal::{Signal, SignalDetector};
use crate::components::summary::{SummaryReport, SummaryScheduler};
use crate::components::trend::{Trend, TrendPredictor};
use crate::config::MonitorConfig;
use crate::domain::{Bar, BarInterval, IngestReport, PriceWindow, WindowError};

use super::snapshot::{IndicatorEngine, IndicatorSnapshot};

/// Everything derived during one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub symbol: String,
    pub evaluated_at: DateTime<Utc>,
    pub latest_bar: Option<Bar>,
    pub snapshot: IndicatorSnapshot,
    pub signal: Signal,
    pub trend: Option<Trend>,
    pub summary: Option<SummaryReport>,
}

impl CycleReport {
    pub fn latest_close(&self) -> Option<f64> {
        self.latest_bar.map(|b| b.close)
    }

    /// Alert texts in dispatch order: summary first, then the signal.
    pub fn messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(summary) = &self.summary {
            out.push(summary.render());
        }
        if let Some(alert) = self.signal.alert_message(&self.symbol) {
            out.push(alert);
        }
        out
    }
}

/// Outcome of handing a cycle's messages to a dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub sent: usize,
    pub failed: usize,
}

pub struct Monitor {
    symbol: String,
    interval: BarInterval,
    window: PriceWindow,
    engine: IndicatorEngine,
    scheduler: SummaryScheduler,
}

impl Monitor {
    pub fn new(config: &MonitorConfig) -> Result<Self, WindowError> {
        Ok(Self {
            symbol: config.symbol.clone(),
            interval: config.interval,
            window: PriceWindow::new(config.capacity)?,
            engine: IndicatorEngine::new(),
            scheduler: SummaryScheduler::new(config.symbol.clone(), config.summary_interval()),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn window(&self) -> &PriceWindow {
        &self.window
    }

    pub fn scheduler(&self) -> &SummaryScheduler {
        &self.scheduler
    }

    /// How many bars to request so the window catches up to `now`.
    ///
    /// An empty window asks for a full capacity; otherwise the bars elapsed
    /// since the latest one plus a small overlap.
    pub fn bars_needed(&self, now: DateTime<Utc>) -> usize {
        let capacity = self.window.capacity();
        let Some(latest) = self.window.latest() else {
            return capacity;
        };
        let bar_ms = self.interval.duration().as_millis() as i64;
        let elapsed = now.timestamp_millis().saturating_sub(latest.timestamp).max(0);
        let missing = (elapsed / bar_ms) as usize;
        missing.saturating_add(2).min(capacity)
    }

    /// Merge freshly fetched bars into the window.
    pub fn ingest(&mut self, bars: impl IntoIterator<Item = Bar>) -> IngestReport {
        let report = self.window.extend(bars);
        if report.rejected > 0 {
            warn!(rejected = report.rejected, "bars failed sanity check and were dropped");
        }
        debug!(
            appended = report.appended,
            skipped = report.skipped,
            window = self.window.len(),
            "ingested bars"
        );
        report
    }

    /// Recompute indicators and run every decision for the current window.
    ///
    /// A window that did not advance since the last cycle simply produces the
    /// same snapshot again.
    pub fn evaluate(&mut self, now: DateTime<Utc>) -> CycleReport {
        let snapshot = self.engine.compute(&self.window);
        let latest_bar = self.window.latest().copied();

        let summary = self.scheduler.maybe_emit(now, &self.window, &snapshot);
        let signal = SignalDetector::classify(&snapshot, latest_bar.map(|b| b.close));
        let trend = TrendPredictor::predict(&self.window);

        if signal.is_actionable() {
            info!(symbol = %self.symbol, %signal, "signal fired");
        }

        CycleReport {
            symbol: self.symbol.clone(),
            evaluated_at: now,
            latest_bar,
            snapshot,
            signal,
            trend,
            summary,
        }
    }

    /// `ingest` followed by `evaluate`.
    pub fn run_cycle(
        &mut self,
        bars: impl IntoIterator<Item = Bar>,
        now: DateTime<Utc>,
    ) -> (IngestReport, CycleReport) {
        let ingest = self.ingest(bars);
        (ingest, self.evaluate(now))
    }

    /// Send every message of `report`; failures are logged, never fatal.
    pub fn dispatch(report: &CycleReport, dispatcher: &dyn AlertDispatcher) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        for message in report.messages() {
            match dispatcher.send(&message) {
                Ok(()) => outcome.sent += 1,
                Err(e) => {
                    warn!(dispatcher = dispatcher.name(), error = %e, "alert delivery failed");
                    outcome.failed += 1;
                }
            }
        }
        outcome
    }
}
