//! Domain types for Bandwatch

pub mod bar;
pub mod interval;
pub mod window;

pub use bar::Bar;
pub use interval::BarInterval;
pub use window::{IngestReport, PriceWindow, WindowError, DEFAULT_CAPACITY};
