//! Decision components: indicator trait, signal detector, trend predictor,
//! summary scheduler.

pub mod indicator;
pub mod signal;
pub mod summary;
pub mod trend;

pub use indicator::Indicator;
pub use signal::{Signal, SignalDetector};
pub use summary::{ChangeWindow, SummaryReport, SummaryScheduler};
pub use trend::{Trend, TrendPredictor};
