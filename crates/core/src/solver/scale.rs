//! Cutoff field and thickness scale
//!
//! The cutoff field is modeled as the square root of the effective surface
//! density, `ω_cut = sqrt(max(Σ, 0))`. Its thickness scale is the inverse
//! relative gradient,
//!
//! ```text
//! g = |∇ω_cut| + ε
//! H = 1 / max(g / max(ω_cut, ε), ε)
//! ```
//!
//! so `H` is large where `ω_cut` varies slowly relative to its magnitude and
//! small across sharp transitions. `H` is bounded to `[ε, 1/ε]`-ish values and
//! is always strictly positive.

use super::gradient::{gradient_2d, BoundaryPolicy};
use crate::grid::{GridSpacing, ScalarGrid, VectorField2D};
use tracing::debug;

/// Floor applied to magnitudes and ratios to keep divisions finite
pub const DEFAULT_EPSILON: f64 = 1e-12;

/// Parameters for scale estimation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParams {
    /// Floor for magnitudes and ratios
    pub epsilon: f64,
    /// Edge treatment for the gradient stencil
    pub boundary: BoundaryPolicy,
    /// Cell spacing
    pub spacing: GridSpacing,
}

impl Default for ScaleParams {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            boundary: BoundaryPolicy::Periodic,
            spacing: GridSpacing::default(),
        }
    }
}

/// Cutoff field, its gradient, and the derived thickness scale
#[derive(Debug, Clone)]
pub struct ScaleEstimate {
    /// `ω_cut`, non-negative wherever the input is not NaN
    pub omega_cut: ScalarGrid,
    /// `∇ω_cut`
    pub gradient: VectorField2D,
    /// `|∇ω_cut| + ε`
    pub gradient_norm: ScalarGrid,
    /// Thickness scale `H`, strictly positive
    pub thickness: ScalarGrid,
}

/// `sqrt(max(v, 0))` that lets NaN through rather than masking it
#[inline]
fn clipped_sqrt(v: f64) -> f64 {
    if v < 0.0 {
        0.0
    } else {
        v.sqrt()
    }
}

/// Cutoff field `ω_cut = sqrt(max(Σ, 0))`
///
/// Negative densities are clipped to zero. NaN is not filtered and stays NaN.
#[must_use]
pub fn cutoff_field(sigma: &ScalarGrid) -> ScalarGrid {
    sigma.map(clipped_sqrt)
}

/// Derive `ω_cut`, its gradient, and `H` from a density grid
#[must_use]
pub fn estimate_scale(sigma: &ScalarGrid, params: &ScaleParams) -> ScaleEstimate {
    let eps = params.epsilon;
    let omega_cut = cutoff_field(sigma);
    let gradient = gradient_2d(&omega_cut, params.boundary, &params.spacing);
    let gradient_norm = gradient.magnitude().map(|g| g + eps);

    let thickness = ScalarGrid::from_fn(omega_cut.width(), omega_cut.height(), |x, y| {
        let relative = gradient_norm.get(x, y) / omega_cut.get(x, y).max(eps);
        1.0 / relative.max(eps)
    });

    let saturation = 1.0 / eps;
    let saturated = thickness
        .as_slice()
        .iter()
        .filter(|&&h| h >= saturation)
        .count();
    debug!(
        "Scale estimate: {}x{} grid, {} cells with saturated thickness",
        omega_cut.width(),
        omega_cut.height(),
        saturated
    );

    ScaleEstimate {
        omega_cut,
        gradient,
        gradient_norm,
        thickness,
    }
}
