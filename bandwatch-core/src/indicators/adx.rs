//! Directional movement family: TR, +DM/-DM, +DI/-DI, DX, ADX.
//!
//! Steps:
//! 1. TR = max(high-low, |high-prev_close|, |low-prev_close|)
//! 2. +DM = max(high-prev_high, 0) when (high-prev_high) > (prev_low-low), else 0.
//!    -DM mirrors it with the roles swapped.
//! 3. +DI = 100 * EWMA_span(+DM / TR), -DI likewise. TR == 0 makes the ratio
//!    indeterminate and the EWMA skips it.
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI), indeterminate when the sum is 0.
//! 5. ADX = EWMA_span(DX)
//!
//! The first bar has no predecessor, so TR and DM start indeterminate.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

use super::ewm::ewm_of_series;
use super::finite;

/// Every intermediate series of the directional computation, aligned to bars.
#[derive(Debug, Clone, Default)]
pub struct DirectionalSeries {
    pub tr: Vec<Option<f64>>,
    pub dm_plus: Vec<Option<f64>>,
    pub dm_minus: Vec<Option<f64>>,
    pub di_plus: Vec<Option<f64>>,
    pub di_minus: Vec<Option<f64>>,
    pub dx: Vec<Option<f64>>,
    pub adx: Vec<Option<f64>>,
}

/// True Range series. TR[0] is indeterminate (no previous close).
pub fn true_range(bars: &[Bar]) -> Vec<Option<f64>> {
    let mut tr = vec![None; bars.len()];
    for (i, w) in bars.windows(2).enumerate() {
        let (prev, cur) = (&w[0], &w[1]);
        let pc = prev.close;
        tr[i + 1] = Some(
            (cur.high - cur.low)
                .max((cur.high - pc).abs())
                .max((cur.low - pc).abs()),
        );
    }
    tr
}

/// +DM and -DM series. Index 0 is indeterminate.
pub fn directional_movement(bars: &[Bar]) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let n = bars.len();
    let mut plus = vec![None; n];
    let mut minus = vec![None; n];

    for (i, w) in bars.windows(2).enumerate() {
        let up = w[1].high - w[0].high;
        let down = w[0].low - w[1].low;

        plus[i + 1] = Some(if up > down { up.max(0.0) } else { 0.0 });
        minus[i + 1] = Some(if down > up { down.max(0.0) } else { 0.0 });
    }

    (plus, minus)
}

fn ratio(num: Option<f64>, den: Option<f64>) -> Option<f64> {
    match (num, den) {
        (Some(n), Some(d)) if d != 0.0 => finite(n / d),
        _ => None,
    }
}

/// Compute the full directional family with smoothing span `period`.
pub fn directional_series(bars: &[Bar], period: usize) -> DirectionalSeries {
    let tr = true_range(bars);
    let (dm_plus, dm_minus) = directional_movement(bars);

    let plus_ratio: Vec<Option<f64>> = dm_plus
        .iter()
        .zip(&tr)
        .map(|(&dm, &t)| ratio(dm, t))
        .collect();
    let minus_ratio: Vec<Option<f64>> = dm_minus
        .iter()
        .zip(&tr)
        .map(|(&dm, &t)| ratio(dm, t))
        .collect();

    let di_plus: Vec<Option<f64>> = ewm_of_series(&plus_ratio, period)
        .into_iter()
        .map(|v| v.map(|x| 100.0 * x))
        .collect();
    let di_minus: Vec<Option<f64>> = ewm_of_series(&minus_ratio, period)
        .into_iter()
        .map(|v| v.map(|x| 100.0 * x))
        .collect();

    let dx: Vec<Option<f64>> = di_plus
        .iter()
        .zip(&di_minus)
        .map(|(&p, &m)| {
            let (p, m) = (p?, m?);
            ratio(Some(100.0 * (p - m).abs()), Some(p + m))
        })
        .collect();

    let adx = ewm_of_series(&dx, period);

    DirectionalSeries {
        tr,
        dm_plus,
        dm_minus,
        di_plus,
        di_minus,
        dx,
        adx,
    }
}

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    name: String,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self {
            period,
            name: format!("adx_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    /// One bar for the previous-bar deltas; smoothing is seeded immediately.
    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        directional_series(bars, self.period).adx
    }
}
