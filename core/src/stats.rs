//! Order statistics over `f64` samples.

/// Quantile with linear interpolation between closest ranks.
///
/// `q` is clamped to `[0, 1]`. Returns `NaN` for an empty sample.
pub fn quantile_linear(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, q)
}

/// As [`quantile_linear`] on an already ascending sample.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Middle value; mean of the two middle values for even sizes.
pub fn median(values: &[f64]) -> f64 {
    quantile_linear(values, 0.5)
}
