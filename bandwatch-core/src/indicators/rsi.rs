//! Relative Strength Index (RSI), simple-average variant.
//!
//! avg_gain / avg_loss are plain rolling means of the last `period` close deltas.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period (needs period + 1 closes).
//! Edge cases: avg_loss == 0 with avg_gain > 0 → 100; both zero → None.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

use super::finite;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let n = bars.len();
        let mut result = vec![None; n];

        if n < self.period + 1 {
            return result;
        }

        // deltas[k] is the change into bar k + 1
        let deltas: Vec<f64> = bars.windows(2).map(|w| w[1].close - w[0].close).collect();

        for (k, window) in deltas.windows(self.period).enumerate() {
            let mut avg_gain = 0.0;
            let mut avg_loss = 0.0;
            for &d in window {
                avg_gain += d.max(0.0);
                avg_loss += (-d).max(0.0);
            }
            avg_gain /= self.period as f64;
            avg_loss /= self.period as f64;

            result[k + self.period] = compute_rsi(avg_gain, avg_loss);
        }

        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if !avg_gain.is_finite() || !avg_loss.is_finite() {
        None
    } else if avg_loss == 0.0 && avg_gain == 0.0 {
        None // no movement: the ratio is undefined
    } else if avg_loss == 0.0 {
        Some(100.0)
    } else {
        finite(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn rsi_all_gains() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_eq!(result[3], Some(100.0));
        assert_eq!(result[5], Some(100.0));
    }

    #[test]
    fn rsi_all_losses() {
        let bars = make_bars(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3].unwrap(), 0.0, 1e-9);
    }

    #[test]
    fn rsi_flat_is_indeterminate() {
        let bars = make_bars(&[50.0; 6]);
        let result = Rsi::new(3).compute(&bars);
        assert!(result.iter().all(Option::is_none));
    }

    #[test]
    fn rsi_mixed() {
        // Closes: 44, 44.34, 44.09, 43.61, 44.33
        // Deltas: +0.34, -0.25, -0.48, +0.72
        // RSI[3] over (+0.34, -0.25, -0.48): gain 0.34, loss 0.73
        //   = 100 - 100 / (1 + 0.34 / 0.73)
        // RSI[4] over (-0.25, -0.48, +0.72): gain 0.72, loss 0.73
        let bars = make_bars(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        let result = Rsi::new(3).compute(&bars);

        assert!(result[..3].iter().all(Option::is_none));
        let expected3 = 100.0 - 100.0 / (1.0 + 0.34 / 0.73);
        let expected4 = 100.0 - 100.0 / (1.0 + 0.72 / 0.73);
        assert_approx(result[3].unwrap(), expected3, 1e-9);
        assert_approx(result[4].unwrap(), expected4, 1e-9);
    }

    #[test]
    fn rsi_window_forgets_old_moves() {
        // A drop followed by `period` rises: the drop leaves the window.
        let bars = make_bars(&[10.0, 5.0, 6.0, 7.0, 8.0]);
        let result = Rsi::new(3).compute(&bars);
        assert!(result[3].unwrap() < 100.0);
        assert_eq!(result[4], Some(100.0));
    }

    #[test]
    fn rsi_bounds() {
        let bars = make_bars(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let result = Rsi::new(3).compute(&bars);
        for (i, v) in result.iter().enumerate() {
            if let Some(v) = v {
                assert!((0.0..=100.0).contains(v), "RSI out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_needs_period_plus_one_bars() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        assert!(Rsi::new(3).compute(&bars).iter().all(Option::is_none));
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
