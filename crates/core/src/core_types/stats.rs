//! Reductions over the finite values of a field
//!
//! Input grids may carry NaN or ±Inf from upstream resampling. These helpers
//! mask non-finite values before reducing, which is the only place this crate
//! filters them.

/// Collect the finite values of `values`, sorted ascending.
fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    finite.sort_unstable_by(f64::total_cmp);
    finite
}

/// Median of the finite values, `None` if there are none.
///
/// For an even count the two middle values are averaged.
///
/// # Example
///
/// ```
/// use field_synth_core::core_types::finite_median;
///
/// assert_eq!(finite_median(&[3.0, f64::NAN, 1.0, 2.0]), Some(2.0));
/// assert_eq!(finite_median(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
/// assert_eq!(finite_median(&[f64::INFINITY]), None);
/// ```
#[must_use]
pub fn finite_median(values: &[f64]) -> Option<f64> {
    let finite = sorted_finite(values);
    let n = finite.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 1 {
        Some(finite[mid])
    } else {
        Some(0.5 * (finite[mid - 1] + finite[mid]))
    }
}

/// Quantile `q ∈ [0, 1]` of the finite values with linear interpolation
/// between order statistics, `None` if there are no finite values.
#[must_use]
pub fn finite_quantile(values: &[f64], q: f64) -> Option<f64> {
    let finite = sorted_finite(values);
    if finite.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (finite.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(finite[lo] + (finite[hi] - finite[lo]) * frac)
}

/// Count of non-finite entries
#[must_use]
pub fn count_non_finite(values: &[f64]) -> usize {
    values.iter().filter(|v| !v.is_finite()).count()
}
