//! Central finite-difference gradients
//!
//! All derivatives use the two-point central stencil
//! `∂a/∂x ≈ (a[i+1] - a[i-1]) / (2·dx)`. How the stencil treats the grid edges
//! is set by [`BoundaryPolicy`]:
//!
//! - `Periodic` wraps indices modulo the axis length. This treats opposite
//!   edges as neighbours, an approximation that is only sound when edge values
//!   carry no physical boundary (e.g. maps padded with empty sky).
//! - `Reflect` mirrors about the edge cell, giving zero normal derivative there.
//! - `Clamp` falls back to the one-sided difference at the edges.
//!
//! An axis of length 1 always has zero derivative.

use crate::grid::{GridSpacing, ScalarGrid, VectorField2D, VolumeGrid};
use serde::{Deserialize, Serialize};

/// Edge treatment for the central-difference stencil
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Indices wrap around modulo the axis length
    #[default]
    Periodic,
    /// Mirror about the edge cell (`a[-1] = a[1]`)
    Reflect,
    /// One-sided difference at the edges
    Clamp,
}

impl BoundaryPolicy {
    /// Stencil for index `i` on an axis of length `n`
    ///
    /// # Returns
    ///
    /// `(minus, plus, span)`: neighbour indices and their distance in cells.
    /// A span of zero means the derivative is identically zero.
    #[inline]
    #[must_use]
    pub fn stencil(self, i: usize, n: usize) -> (usize, usize, f64) {
        if n <= 1 {
            return (i, i, 0.0);
        }
        match self {
            Self::Periodic => ((i + n - 1) % n, (i + 1) % n, 2.0),
            Self::Reflect => {
                let minus = if i == 0 { 1 } else { i - 1 };
                let plus = if i + 1 == n { n - 2 } else { i + 1 };
                (minus, plus, 2.0)
            }
            Self::Clamp => {
                let minus = i.saturating_sub(1);
                let plus = (i + 1).min(n - 1);
                (minus, plus, (plus - minus) as f64)
            }
        }
    }
}

/// Axis of a 2D or 3D grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Columns
    X,
    /// Rows
    Y,
    /// Layers
    Z,
}

impl Axis {
    /// All three axes in `x, y, z` order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    fn spacing(self, spacing: &GridSpacing) -> f64 {
        match self {
            Self::X => spacing.dx,
            Self::Y => spacing.dy,
            Self::Z => spacing.dz,
        }
    }
}

#[inline]
fn difference(minus: f64, plus: f64, span: f64, step: f64) -> f64 {
    if span == 0.0 {
        0.0
    } else {
        (plus - minus) / (span * step)
    }
}

/// Gradient of a 2D field
///
/// `x` holds the derivative along columns, `y` along rows. With unit spacing
/// and the periodic policy this is exactly
/// `gx[i,j] = (a[i,j+1] - a[i,j-1]) / 2`.
#[must_use]
pub fn gradient_2d(
    field: &ScalarGrid,
    policy: BoundaryPolicy,
    spacing: &GridSpacing,
) -> VectorField2D {
    let (width, height) = (field.width(), field.height());
    let gx = ScalarGrid::from_fn(width, height, |x, y| {
        let (m, p, span) = policy.stencil(x, width);
        difference(field.get(m, y), field.get(p, y), span, spacing.dx)
    });
    let gy = ScalarGrid::from_fn(width, height, |x, y| {
        let (m, p, span) = policy.stencil(y, height);
        difference(field.get(x, m), field.get(x, p), span, spacing.dy)
    });
    VectorField2D { x: gx, y: gy }
}

/// Partial derivative of a volume along one axis
#[must_use]
pub fn partial_3d(
    volume: &VolumeGrid,
    axis: Axis,
    policy: BoundaryPolicy,
    spacing: &GridSpacing,
) -> VolumeGrid {
    let (nx, ny, nz) = volume.dims();
    let step = axis.spacing(spacing);
    VolumeGrid::from_fn(nx, ny, nz, |x, y, z| match axis {
        Axis::X => {
            let (m, p, span) = policy.stencil(x, nx);
            difference(volume.get(m, y, z), volume.get(p, y, z), span, step)
        }
        Axis::Y => {
            let (m, p, span) = policy.stencil(y, ny);
            difference(volume.get(x, m, z), volume.get(x, p, z), span, step)
        }
        Axis::Z => {
            let (m, p, span) = policy.stencil(z, nz);
            difference(volume.get(x, y, m), volume.get(x, y, p), span, step)
        }
    })
}

/// Gradient of a volume as `[∂x, ∂y, ∂z]`
#[must_use]
pub fn gradient_3d(
    volume: &VolumeGrid,
    policy: BoundaryPolicy,
    spacing: &GridSpacing,
) -> [VolumeGrid; 3] {
    Axis::ALL.map(|axis| partial_3d(volume, axis, policy, spacing))
}
