//! Short-horizon trend prediction by least-squares slope.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::PriceWindow;
use crate::indicators::finite;

/// Predicted direction of the next few bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Up,
    Down,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::Up => "UP",
            Trend::Down => "DOWN",
        })
    }
}

/// Fits OLS to `(index, close)` over the most recent closes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendPredictor;

impl TrendPredictor {
    /// Number of trailing closes the regression uses.
    pub const HORIZON: usize = 5;

    /// UP for a strictly positive slope, DOWN otherwise (a flat fit is DOWN).
    ///
    /// Shorter windows regress over what is available; fewer than two closes
    /// cannot define a slope and yield `None`.
    pub fn predict(window: &PriceWindow) -> Option<Trend> {
        let closes = window.tail_closes(Self::HORIZON);
        let slope = Self::slope(&closes)?;
        Some(if slope > 0.0 { Trend::Up } else { Trend::Down })
    }

    /// Least-squares slope of `values` against their indices 0..n.
    pub fn slope(values: &[f64]) -> Option<f64> {
        let n = values.len();
        if n < 2 {
            return None;
        }
        let nf = n as f64;
        let mean_x = (nf - 1.0) / 2.0;
        let mean_y = values.iter().sum::<f64>() / nf;

        let mut sxy = 0.0;
        let mut sxx = 0.0;
        for (i, &y) in values.iter().enumerate() {
            let dx = i as f64 - mean_x;
            sxy += dx * (y - mean_y);
            sxx += dx * dx;
        }
        finite(sxy / sxx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;

    fn window_of(closes: &[f64]) -> PriceWindow {
        let mut w = PriceWindow::default();
        for (i, &c) in closes.iter().enumerate() {
            w.append(Bar {
                timestamp: i as i64 * 60_000,
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 0.0,
            })
            .unwrap();
        }
        w
    }

    #[test]
    fn rising_closes_predict_up() {
        let w = window_of(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        assert_eq!(TrendPredictor::predict(&w), Some(Trend::Up));
    }

    #[test]
    fn falling_closes_predict_down() {
        let w = window_of(&[104.0, 103.0, 102.0, 101.0, 100.0]);
        assert_eq!(TrendPredictor::predict(&w), Some(Trend::Down));
    }

    #[test]
    fn flat_closes_predict_down() {
        let w = window_of(&[100.0; 5]);
        assert_eq!(TrendPredictor::predict(&w), Some(Trend::Down));
    }

    #[test]
    fn overflowing_closes_have_no_trend() {
        let w = window_of(&[1e308; 5]);
        assert_eq!(TrendPredictor::slope(&w.tail_closes(5)), None);
        assert_eq!(TrendPredictor::predict(&w), None);
    }

    #[test]
    fn only_last_five_closes_count() {
        // A long decline followed by five rising closes.
        let mut closes: Vec<f64> = (0..20).map(|i| 200.0 - i as f64 * 5.0).collect();
        closes.extend([50.0, 51.0, 52.0, 53.0, 54.0]);
        assert_eq!(TrendPredictor::predict(&window_of(&closes)), Some(Trend::Up));
    }

    #[test]
    fn short_windows_degrade_gracefully() {
        assert_eq!(TrendPredictor::predict(&window_of(&[1.0, 2.0])), Some(Trend::Up));
        assert_eq!(TrendPredictor::predict(&window_of(&[2.0, 1.0, 0.5])), Some(Trend::Down));
        assert_eq!(TrendPredictor::predict(&window_of(&[1.0])), None);
        assert_eq!(TrendPredictor::predict(&PriceWindow::default()), None);
    }

    #[test]
    fn slope_known_value() {
        // y = 2x + 1
        let slope = TrendPredictor::slope(&[1.0, 3.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((slope - 2.0).abs() < 1e-12);
        // V shape: symmetric → zero slope
        let slope = TrendPredictor::slope(&[3.0, 1.0, 0.0, 1.0, 3.0]).unwrap();
        assert!(slope.abs() < 1e-12);
    }

    #[test]
    fn trend_display() {
        assert_eq!(Trend::Up.to_string(), "UP");
        assert_eq!(Trend::Down.to_string(), "DOWN");
    }
}
