//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! Three bands (separate Indicator instances):
//! - Middle: SMA(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//!
//! Uses sample stddev (divide by N - 1).
//! Lookback: period - 1.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

use super::finite;
use super::sma::sma_of_series;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    fn with_band(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2");
        let label = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
        };
        Self {
            period,
            multiplier,
            band,
            name: format!("bollinger_{label}_{period}_{multiplier}"),
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Upper)
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Middle)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Lower)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let middle = sma_of_series(&closes, self.period);
        if self.band == BollingerBand::Middle {
            return middle;
        }

        let stddev = rolling_std(&closes, self.period);
        let sign = match self.band {
            BollingerBand::Upper => 1.0,
            _ => -1.0,
        };
        middle
            .iter()
            .zip(&stddev)
            .map(|(m, s)| finite(m.as_ref()? + sign * self.multiplier * s.as_ref()?))
            .collect()
    }
}

/// Rolling sample standard deviation of close prices.
#[derive(Debug, Clone)]
pub struct StdDev {
    period: usize,
    name: String,
}

impl StdDev {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "sample stddev period must be >= 2");
        Self {
            period,
            name: format!("stddev_{period}"),
        }
    }
}

impl Indicator for StdDev {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rolling_std(&closes, self.period)
    }
}

/// Trailing sample standard deviation (N - 1 denominator).
pub fn rolling_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if period < 2 || n < period {
        return result;
    }

    for (i, window) in values.windows(period).enumerate() {
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / (period - 1) as f64;
        result[i + period - 1] = finite(variance.sqrt());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn bollinger_middle_is_sma() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Bollinger::middle(3, 2.0).compute(&bars);

        assert!(result[0].is_none());
        assert!(result[1].is_none());
        assert_approx(result[2].unwrap(), 11.0, DEFAULT_EPSILON);
        assert_approx(result[3].unwrap(), 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sample_stddev_known_value() {
        // Sample stddev of (10, 11, 12) = sqrt(((1 + 0 + 1) / 2)) = 1.0
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let result = StdDev::new(3).compute(&bars);
        assert_approx(result[2].unwrap(), 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_bands_known_values() {
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let upper = Bollinger::upper(3, 2.0).latest(&bars).unwrap();
        let lower = Bollinger::lower(3, 2.0).latest(&bars).unwrap();
        assert_approx(upper, 13.0, DEFAULT_EPSILON);
        assert_approx(lower, 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_bands_symmetric() {
        let bars = make_bars(&[10.0, 11.5, 12.0, 13.7, 14.0]);
        let upper = Bollinger::upper(3, 2.0).compute(&bars);
        let middle = Bollinger::middle(3, 2.0).compute(&bars);
        let lower = Bollinger::lower(3, 2.0).compute(&bars);

        for i in 2..5 {
            let half_width = upper[i].unwrap() - middle[i].unwrap();
            assert_approx(middle[i].unwrap() - lower[i].unwrap(), half_width, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn bollinger_constant_price_zero_width() {
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0]);
        let upper = Bollinger::upper(3, 2.0).compute(&bars);
        let lower = Bollinger::lower(3, 2.0).compute(&bars);
        let stddev = StdDev::new(3).compute(&bars);

        assert_approx(upper[3].unwrap(), 100.0, DEFAULT_EPSILON);
        assert_approx(lower[3].unwrap(), 100.0, DEFAULT_EPSILON);
        assert_eq!(stddev[3], Some(0.0));
    }

    #[test]
    fn bollinger_too_few_bars() {
        let bars = make_bars(&[10.0, 11.0]);
        assert!(Bollinger::upper(3, 2.0).compute(&bars).iter().all(Option::is_none));
        assert!(StdDev::new(3).compute(&bars).iter().all(Option::is_none));
    }

    #[test]
    fn bollinger_lookback() {
        assert_eq!(Bollinger::upper(20, 2.0).lookback(), 19);
        assert_eq!(Bollinger::lower(20, 2.0).name(), "bollinger_lower_20_2");
    }
}
