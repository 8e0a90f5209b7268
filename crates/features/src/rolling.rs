//! Shift, trailing-window and exponential smoothing primitives.
//!
//! Window operations work on [`Value`] series: a window containing any
//! undefined cell, or one that does not yet have `window` rows of history,
//! produces an undefined output.

use predictor_core::{defined, Value};
use statrs::statistics::Statistics;

/// Lift a fully defined series into cells.
pub fn to_values(xs: &[f64]) -> Vec<Value> {
    xs.iter().map(|&x| defined(x)).collect()
}

/// Shift a series back by `lag` rows: `out[i] = values[i - lag]`.
pub fn shift(values: &[Value], lag: usize) -> Vec<Value> {
    (0..values.len())
        .map(|i| if i >= lag { values[i - lag] } else { None })
        .collect()
}

/// Apply `f` to each complete trailing window, aligned to the window's
/// last row.
fn rolling_apply(values: &[Value], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<Value> {
    let mut out = vec![None; values.len()];
    if window == 0 || window > values.len() {
        return out;
    }

    for (start, slice) in values.windows(window).enumerate() {
        let complete: Option<Vec<f64>> = slice.iter().copied().collect();
        out[start + window - 1] = complete.and_then(|xs| defined(f(&xs)));
    }
    out
}

/// Trailing mean over `window` rows.
pub fn rolling_mean(values: &[Value], window: usize) -> Vec<Value> {
    rolling_apply(values, window, |xs| xs.iter().mean())
}

/// Trailing sample standard deviation (n - 1 denominator) over `window` rows.
///
/// A window of one row has no sample deviation and is always undefined.
pub fn rolling_std(values: &[Value], window: usize) -> Vec<Value> {
    rolling_apply(values, window, |xs| xs.iter().std_dev())
}

/// Recursive exponential moving average seeded with the first value.
///
/// `ema[0] = values[0]`, `ema[i] = ema[i-1] + alpha * (values[i] - ema[i-1])`
/// with `alpha = 2 / (span + 1)`.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for &x in values {
        let next = match prev {
            Some(p) => p + alpha * (x - p),
            None => x,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}
