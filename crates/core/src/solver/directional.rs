//! Outward normals, radial geometry, and the angular kernel
//!
//! The outward normal points down the cutoff gradient,
//! `n = -∇ω_cut / (g + ε)` with `g = |∇ω_cut| + ε`. The radial unit field
//! points from the geometric grid center `((ny-1)/2, (nx-1)/2)` to each cell.
//! Their alignment `cosθ = n · r̂` drives two factors:
//!
//! - the one-sided projection `p = max(cosθ, 0)`: only surfaces facing away
//!   from the center contribute;
//! - the angular kernel `G(θ; β) = (1 + β cosθ) / (1 + β/2)`, a linear
//!   anisotropy with `G ≡ 1` at `β = 0`.
//!
//! # Degenerate cells
//!
//! Where the gradient vanishes the normal is the zero vector (the division is
//! floored, never a domain error). At the center cell the radius is zero and is
//! replaced by `+∞`, so its radial vector is zero as well. Both give
//! `cosθ = 0` and therefore `p = 0`.

use crate::error::FieldResult;
use crate::grid::{ScalarGrid, VectorField2D};
use std::f64::consts::PI;

/// Normal, radial, and angle fields for one cutoff gradient
#[derive(Debug, Clone)]
pub struct DirectionalFields {
    /// Unit outward normal (zero where the gradient vanishes)
    pub normal: VectorField2D,
    /// Unit radial direction from the grid center (zero at the center)
    pub radial: VectorField2D,
    /// `n · r̂`, in `[-1, 1]`
    pub cos_angle: ScalarGrid,
    /// One-sided projection `max(cosθ, 0)`
    pub projection: ScalarGrid,
}

/// Outward normal `-∇ω / (g + ε)`
///
/// `gradient_norm` is the already floored magnitude `|∇ω| + ε`.
#[must_use]
pub fn outward_normal(
    gradient: &VectorField2D,
    gradient_norm: &ScalarGrid,
    epsilon: f64,
) -> VectorField2D {
    let (width, height) = (gradient_norm.width(), gradient_norm.height());
    let scale = |x: usize, y: usize| gradient_norm.get(x, y) + epsilon;
    VectorField2D {
        x: ScalarGrid::from_fn(width, height, |x, y| -gradient.x.get(x, y) / scale(x, y)),
        y: ScalarGrid::from_fn(width, height, |x, y| -gradient.y.get(x, y) / scale(x, y)),
    }
}

/// Radius from the grid center, with the center itself mapped to `+∞`
#[inline]
fn offset_and_radius(x: usize, y: usize, width: usize, height: usize) -> (f64, f64, f64) {
    let cx = (width as f64 - 1.0) / 2.0;
    let cy = (height as f64 - 1.0) / 2.0;
    let dx = x as f64 - cx;
    let dy = y as f64 - cy;
    let r = dx.hypot(dy);
    (dx, dy, if r == 0.0 { f64::INFINITY } else { r })
}

/// Unit radial field from the geometric center of a `width × height` grid
///
/// For grids with an odd size on both axes the center cell is exactly zero.
#[must_use]
pub fn radial_unit_field(width: usize, height: usize) -> VectorField2D {
    VectorField2D {
        x: ScalarGrid::from_fn(width, height, |x, y| {
            let (dx, _, r) = offset_and_radius(x, y, width, height);
            dx / r
        }),
        y: ScalarGrid::from_fn(width, height, |x, y| {
            let (_, dy, r) = offset_and_radius(x, y, width, height);
            dy / r
        }),
    }
}

/// Normal, radial, angle, and projection fields
///
/// # Errors
///
/// Returns a shape mismatch if `gradient` and `gradient_norm` disagree.
pub fn directional_fields(
    gradient: &VectorField2D,
    gradient_norm: &ScalarGrid,
    epsilon: f64,
) -> FieldResult<DirectionalFields> {
    gradient.x.ensure_same_shape(gradient_norm, "directional kernel")?;

    let normal = outward_normal(gradient, gradient_norm, epsilon);
    let radial = radial_unit_field(gradient_norm.width(), gradient_norm.height());
    let cos_angle = normal.dot(&radial)?.map(|c| c.clamp(-1.0, 1.0));
    let projection = cos_angle.map(|c| c.max(0.0));

    Ok(DirectionalFields {
        normal,
        radial,
        cos_angle,
        projection,
    })
}

/// Angular kernel `G(θ; β) = (1 + β cosθ) / (1 + β/2)`
///
/// Intended for `β ∈ [-1, 1]`; the denominator vanishes at `β = -2`.
///
/// # Example
///
/// ```
/// use field_synth_core::solver::directional::angular_kernel;
///
/// assert_eq!(angular_kernel(0.3, 0.0), 1.0);
/// assert_eq!(angular_kernel(1.0, 1.0), 2.0 / 1.5);
/// ```
#[inline]
#[must_use]
pub fn angular_kernel(cos_theta: f64, beta: f64) -> f64 {
    (1.0 + beta * cos_theta) / (1.0 + 0.5 * beta)
}

/// [`angular_kernel`] applied to every cell of an angle field
#[must_use]
pub fn angular_kernel_field(cos_angle: &ScalarGrid, beta: f64) -> ScalarGrid {
    cos_angle.map(|c| angular_kernel(c, beta))
}

/// Forwardization strength `β = min(1, sqrt(max(χ, 0)))`
#[must_use]
pub fn beta_of_chi(chi: f64) -> f64 {
    chi.max(0.0).sqrt().min(1.0)
}

/// Forward-scattering Lambert kernel
///
/// `K(θ; χ) = max(cosθ, 0)/π · (1 + β cosθ)/(1 + β/2)` with
/// `β = beta_of_chi(χ)`. Its integral over the forward hemisphere is
/// `(1 + 2β/3) / (1 + β/2)`, which is exactly one for an isotropic (`χ = 0`)
/// emitter.
#[must_use]
pub fn lambert_forward(cos_theta: f64, chi: f64) -> f64 {
    let beta = beta_of_chi(chi);
    cos_theta.max(0.0) / PI * angular_kernel(cos_theta, beta)
}
