//! Rolling mean and sample standard deviation helpers.
//!
//! Standard deviation uses the sample estimator (divides by n - 1).

/// Arithmetic mean; 0.0 for an empty window.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; 0.0 when fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - m;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Mean of the last `window` values; `None` when not enough values.
pub fn trailing_mean(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    Some(mean(&values[values.len() - window..]))
}

/// `a / b - 1`, or 0.0 when `b` is not a positive price.
pub fn pct_change(a: f64, b: f64) -> f64 {
    if b > 0.0 && a.is_finite() {
        a / b - 1.0
    } else {
        0.0
    }
}
