//! Soft-delta shell around the characteristic cutoff
//!
//! The shell weight is a Gaussian bump in `ω_cut` centered on the grid's
//! typical cutoff value `ω*`:
//!
//! ```text
//! δ(x) = exp(-(ω_cut(x) - ω*)² / (2 H²)) / (sqrt(2π) · max(H, ε))
//! ```
//!
//! With [`ShellWidth::Adaptive`] each cell uses its own thickness `H(x)` as the
//! width, which localizes sharply across steep transitions but means the
//! weight does not integrate to one over the grid. [`ShellWidth::Global`] uses
//! a single width (the median finite `H`) for every cell.

use crate::core_types::finite_median;
use crate::grid::ScalarGrid;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Value of `ω*` when the grid has no usable median
pub const FALLBACK_REFERENCE: f64 = 1.0;

/// Width used by the shell Gaussian
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShellWidth {
    /// Per-cell thickness `H(x)`
    #[default]
    Adaptive,
    /// Median of the finite thickness values, shared by all cells
    Global,
}

/// Reference cutoff `ω*`: median of the finite values of `ω_cut`
///
/// Falls back to [`FALLBACK_REFERENCE`] when there are no finite values or the
/// median is zero or non-finite.
///
/// # Example
///
/// ```
/// use field_synth_core::grid::ScalarGrid;
/// use field_synth_core::solver::shell::reference_cutoff;
///
/// let zeros = ScalarGrid::new(4, 4);
/// assert_eq!(reference_cutoff(&zeros), 1.0);
///
/// let ramp = ScalarGrid::from_fn(3, 1, |x, _| x as f64 + 1.0);
/// assert_eq!(reference_cutoff(&ramp), 2.0);
/// ```
#[must_use]
pub fn reference_cutoff(omega_cut: &ScalarGrid) -> f64 {
    match finite_median(omega_cut.as_slice()) {
        Some(median) if median != 0.0 && median.is_finite() => median,
        _ => FALLBACK_REFERENCE,
    }
}

/// Shell weight `δ` for every cell
///
/// # Arguments
///
/// * `omega_cut` - Cutoff field
/// * `thickness` - Thickness scale `H`, same shape as `omega_cut`
/// * `omega_star` - Reference cutoff, usually from [`reference_cutoff`]
/// * `width` - Adaptive or global width
/// * `epsilon` - Floor on the normalization width
///
/// Callers pass grids from one [`super::scale::ScaleEstimate`], so the shapes
/// agree by construction.
#[must_use]
pub fn shell_weight(
    omega_cut: &ScalarGrid,
    thickness: &ScalarGrid,
    omega_star: f64,
    width: ShellWidth,
    epsilon: f64,
) -> ScalarGrid {
    let norm = (2.0 * PI).sqrt();
    let global_width = match width {
        ShellWidth::Adaptive => None,
        ShellWidth::Global => Some(finite_median(thickness.as_slice()).unwrap_or(1.0)),
    };
    if let Some(h) = global_width {
        debug!("Shell uses global width H = {h:e}");
    }

    ScalarGrid::from_fn(omega_cut.width(), omega_cut.height(), |x, y| {
        let h = global_width.unwrap_or_else(|| thickness.get(x, y));
        let offset = omega_cut.get(x, y) - omega_star;
        (-(offset * offset) / (2.0 * h * h)).exp() / (norm * h.max(epsilon))
    })
}
