//! Exponentially Weighted Moving Average with span parameterisation.
//!
//! alpha = 2 / (span + 1)
//! Seed: the first determinate input value.
//! Recursion: v[t] = alpha * x[t] + (1 - alpha) * v[t-1]
//!
//! Indeterminate inputs are skipped: the recursion state carries over and the
//! output at that position repeats the carried value.

/// Smoothing factor for a given span.
pub fn span_alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// EWMA of a series with gaps.
pub fn ewm_of_series(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    assert!(span >= 1, "EWMA span must be >= 1");
    let alpha = span_alpha(span);
    let mut state: Option<f64> = None;

    values
        .iter()
        .map(|v| {
            if let Some(x) = *v {
                state = Some(match state {
                    Some(prev) => alpha * x + (1.0 - alpha) * prev,
                    None => x,
                });
            }
            state
        })
        .collect()
}
