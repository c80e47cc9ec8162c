//! Indicator recomputation and the polling-cycle driver

pub mod monitor;
pub mod snapshot;

pub use monitor::{CycleReport, DispatchOutcome, Monitor};
pub use snapshot::{IndicatorEngine, IndicatorSnapshot};
