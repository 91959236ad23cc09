//! Tidal shape tensor and director field
//!
//! The tidal tensor of a potential `Φ` is its trace-free Hessian,
//!
//! ```text
//! Q_ij = ∂i∂jΦ - (tr(∂∂Φ) / 3) δ_ij
//! ```
//!
//! evaluated per voxel with the same central-difference stencil (and boundary
//! policy) as the gradient operator. Second derivatives are central differences
//! of central differences; the mixed terms are symmetrized. The director is the
//! unit eigenvector of the eigenvalue with the largest magnitude.
//!
//! Isotropic cells (all eigenvalues equal, including the zero tensor) have no
//! preferred axis. They get [`DEGENERATE_DIRECTOR`], as do cells whose tensor
//! cannot be decomposed (non-finite potential).

use super::gradient::{partial_3d, Axis, BoundaryPolicy};
use crate::core_types::{canonical_axis, symmetric_eigen_descending, Tensor3, Vec3};
use crate::grid::{GridSpacing, ScalarGrid, VolumeGrid};
use rayon::prelude::*;
use tracing::debug;

/// Director assigned to isotropic or undecomposable cells (`ẑ`)
pub const DEGENERATE_DIRECTOR: [f64; 3] = [0.0, 0.0, 1.0];

/// Relative eigenvalue spread below which a tensor is treated as isotropic
pub const ISOTROPY_TOLERANCE: f64 = 1e-12;

/// Per-voxel trace-free tensor and its principal director
#[derive(Debug, Clone)]
pub struct TidalField {
    tensors: Vec<Tensor3>,
    directors: Vec<Vec3>,
    nx: usize,
    ny: usize,
    nz: usize,
}

/// Remove the isotropic part: `m - (tr m / 3) I`
#[must_use]
pub fn trace_free(m: &Tensor3) -> Tensor3 {
    m - Tensor3::identity() * (m.trace() / 3.0)
}

/// Unit eigenvector of the largest-magnitude eigenvalue of a symmetric tensor
///
/// Always returns a unit vector; see [`DEGENERATE_DIRECTOR`].
#[must_use]
pub fn principal_director(q: &Tensor3) -> Vec3 {
    dominant_axis(q).unwrap_or_else(|| Vec3::from(DEGENERATE_DIRECTOR))
}

/// Dominant eigen-axis, `None` for isotropic or undecomposable tensors
fn dominant_axis(q: &Tensor3) -> Option<Vec3> {
    let (values, vectors) = symmetric_eigen_descending(q)?;

    let scale = values.amax();
    if scale == 0.0 || values[0] - values[2] <= ISOTROPY_TOLERANCE * scale {
        return None;
    }

    // Descending order: the dominant magnitude is either the first or the last
    let col = if values[0].abs() >= values[2].abs() { 0 } else { 2 };
    let v = vectors.column(col).into_owned();
    let norm = v.norm();
    (norm.is_finite() && norm > 0.0).then(|| canonical_axis(v / norm))
}

impl TidalField {
    /// Tidal field of a 3D potential
    ///
    /// A single-layer volume (`nz = 1`) has zero derivatives along `z`.
    #[must_use]
    pub fn from_potential(
        potential: &VolumeGrid,
        boundary: BoundaryPolicy,
        spacing: &GridSpacing,
    ) -> Self {
        let (nx, ny, nz) = potential.dims();
        let first = Axis::ALL.map(|axis| partial_3d(potential, axis, boundary, spacing));
        let d = |of: usize, along: Axis| partial_3d(&first[of], along, boundary, spacing);

        let xx = d(0, Axis::X);
        let yy = d(1, Axis::Y);
        let zz = d(2, Axis::Z);
        let xy = d(0, Axis::Y);
        let yx = d(1, Axis::X);
        let xz = d(0, Axis::Z);
        let zx = d(2, Axis::X);
        let yz = d(1, Axis::Z);
        let zy = d(2, Axis::Y);

        let tensors: Vec<Tensor3> = (0..potential.len())
            .into_par_iter()
            .map(|i| {
                let (hxx, hyy, hzz) = (xx.as_slice()[i], yy.as_slice()[i], zz.as_slice()[i]);
                let hxy = 0.5 * (xy.as_slice()[i] + yx.as_slice()[i]);
                let hxz = 0.5 * (xz.as_slice()[i] + zx.as_slice()[i]);
                let hyz = 0.5 * (yz.as_slice()[i] + zy.as_slice()[i]);
                let hessian = Tensor3::new(hxx, hxy, hxz, hxy, hyy, hyz, hxz, hyz, hzz);
                trace_free(&hessian)
            })
            .collect();

        Self::from_tensors(tensors, nx, ny, nz)
    }

    /// Tidal field of a 2D potential, treated as a single layer
    #[must_use]
    pub fn from_potential_2d(
        potential: &ScalarGrid,
        boundary: BoundaryPolicy,
        spacing: &GridSpacing,
    ) -> Self {
        Self::from_potential(&VolumeGrid::from_layer(potential), boundary, spacing)
    }

    /// Fixed thin-disk tensor `diag(-1/3, -1/3, 2/3)` with director `ẑ`
    ///
    /// Independent of any input; useful as a stand-in where only the disk
    /// geometry is known.
    #[must_use]
    pub fn disk_axes(nx: usize, ny: usize) -> Self {
        let q = Tensor3::from_diagonal(&Vec3::new(-1.0 / 3.0, -1.0 / 3.0, 2.0 / 3.0));
        Self::from_tensors(vec![q; nx * ny], nx, ny, 1)
    }

    /// Wrap precomputed tensors and derive their directors
    fn from_tensors(tensors: Vec<Tensor3>, nx: usize, ny: usize, nz: usize) -> Self {
        let axes: Vec<Option<Vec3>> = tensors.par_iter().map(dominant_axis).collect();
        let degenerate = axes.iter().filter(|a| a.is_none()).count();
        debug!(
            "Tidal field: {}x{}x{} voxels, {} with fallback director",
            nx, ny, nz, degenerate
        );
        let directors = axes
            .into_iter()
            .map(|a| a.unwrap_or_else(|| Vec3::from(DEGENERATE_DIRECTOR)))
            .collect();
        Self {
            tensors,
            directors,
            nx,
            ny,
            nz,
        }
    }

    /// Dimensions as `(nx, ny, nz)`
    #[must_use]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    /// All tensors in `(nz, ny, nx)` order
    #[must_use]
    pub fn tensors(&self) -> &[Tensor3] {
        &self.tensors
    }

    /// All directors in `(nz, ny, nx)` order
    #[must_use]
    pub fn directors(&self) -> &[Vec3] {
        &self.directors
    }

    /// Tensor at voxel `(x, y, z)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn tensor(&self, x: usize, y: usize, z: usize) -> &Tensor3 {
        &self.tensors[self.index(x, y, z)]
    }

    /// Director at voxel `(x, y, z)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn director(&self, x: usize, y: usize, z: usize) -> Vec3 {
        self.directors[self.index(x, y, z)]
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        assert!(
            x < self.nx && y < self.ny && z < self.nz,
            "Coordinates out of bounds"
        );
        (z * self.ny + y) * self.nx + x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn interior(n: usize) -> std::ops::Range<usize> {
        2..n - 2
    }

    #[test]
    fn test_trace_free() {
        let m = Tensor3::new(3.0, 1.0, 0.0, 1.0, 0.0, 2.0, 0.0, 2.0, 6.0);
        let q = trace_free(&m);
        assert_relative_eq!(q.trace(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(q[(0, 1)], 1.0);
        assert_relative_eq!(q[(0, 0)], 0.0);
    }

    #[test]
    fn test_director_of_prolate_tensor() {
        let q = Tensor3::from_diagonal(&Vec3::new(4.0, -2.0, -2.0));
        assert_relative_eq!(principal_director(&q), Vec3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_director_prefers_largest_magnitude() {
        // Negative eigenvalue dominates
        let q = Tensor3::from_diagonal(&Vec3::new(1.0, 1.0, -2.0));
        assert_relative_eq!(principal_director(&q), Vec3::z(), epsilon = 1e-12);
        let q = Tensor3::from_diagonal(&Vec3::new(0.5, -3.0, 2.5));
        assert_relative_eq!(principal_director(&q), Vec3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_director_independent_of_potential_scale() {
        let phi = VolumeGrid::from_fn(9, 9, 9, |x, _, _| {
            let x = x as f64 - 4.0;
            3.0 * x * x
        });
        let tiny = VolumeGrid::from_fn(9, 9, 9, |x, y, z| 1e-14 * phi.get(x, y, z));
        let spacing = GridSpacing::default();
        let unit = TidalField::from_potential(&phi, BoundaryPolicy::Periodic, &spacing);
        let scaled = TidalField::from_potential(&tiny, BoundaryPolicy::Periodic, &spacing);

        assert_relative_eq!(unit.director(4, 4, 4), Vec3::x(), epsilon = 1e-12);
        assert_relative_eq!(scaled.director(4, 4, 4), Vec3::x(), epsilon = 1e-12);

        let q = Tensor3::from_diagonal(&Vec3::new(4e-30, -2e-30, -2e-30));
        assert_relative_eq!(principal_director(&q), Vec3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_isotropic_and_zero_tensors_fall_back() {
        let fallback = Vec3::from(DEGENERATE_DIRECTOR);
        assert_eq!(principal_director(&Tensor3::zeros()), fallback);
        assert_eq!(principal_director(&(Tensor3::identity() * 7.0)), fallback);
        let mut broken = Tensor3::zeros();
        broken[(1, 1)] = f64::INFINITY;
        assert_eq!(principal_director(&broken), fallback);
    }

    #[test]
    fn test_director_off_axis_is_unit() {
        let q = trace_free(&Tensor3::new(2.0, 1.5, 0.3, 1.5, -1.0, 0.7, 0.3, 0.7, 0.4));
        let n = principal_director(&q);
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
        // Eigenvector check: Q n is parallel to n
        let qn = q * n;
        assert_relative_eq!(qn.cross(&n).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_quadratic_potential_hessian() {
        // Φ = 3x² has Hessian diag(6, 0, 0), trace-free diag(4, -2, -2)
        let n = 9;
        let potential = VolumeGrid::from_fn(n, n, n, |x, _, _| 3.0 * (x as f64).powi(2));
        let field = TidalField::from_potential(
            &potential,
            BoundaryPolicy::Periodic,
            &GridSpacing::default(),
        );
        for z in interior(n) {
            for y in interior(n) {
                for x in interior(n) {
                    let q = field.tensor(x, y, z);
                    assert_relative_eq!(q[(0, 0)], 4.0, epsilon = 1e-9);
                    assert_relative_eq!(q[(1, 1)], -2.0, epsilon = 1e-9);
                    assert_relative_eq!(q[(2, 2)], -2.0, epsilon = 1e-9);
                    assert_relative_eq!(q[(0, 1)], 0.0, epsilon = 1e-9);
                    assert_relative_eq!(field.director(x, y, z), Vec3::x(), epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_spherical_potential_is_isotropic() {
        let n = 9;
        let potential = VolumeGrid::from_fn(n, n, n, |x, y, z| {
            (x * x + y * y + z * z) as f64
        });
        let field = TidalField::from_potential(
            &potential,
            BoundaryPolicy::Periodic,
            &GridSpacing::default(),
        );
        let q = field.tensor(4, 4, 4);
        assert_relative_eq!(q.norm(), 0.0, epsilon = 1e-9);
        assert_eq!(field.director(4, 4, 4), Vec3::from(DEGENERATE_DIRECTOR));
    }

    #[test]
    fn test_every_director_is_unit() {
        let potential = VolumeGrid::from_fn(6, 5, 4, |x, y, z| {
            let (x, y, z) = (x as f64, y as f64, z as f64);
            (0.7 * x).sin() * (0.4 * y).cos() + 0.1 * z * z - 0.05 * x * y
        });
        let policies = [
            BoundaryPolicy::Periodic,
            BoundaryPolicy::Reflect,
            BoundaryPolicy::Clamp,
        ];
        for policy in policies {
            let field = TidalField::from_potential(&potential, policy, &GridSpacing::default());
            for (d, q) in field.directors().iter().zip(field.tensors()) {
                assert_relative_eq!(d.norm(), 1.0, epsilon = 1e-9);
                assert_relative_eq!(q.trace(), 0.0, epsilon = 1e-9);
                assert_relative_eq!(*q, q.transpose(), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_disk_axes_scaffold() {
        let field = TidalField::disk_axes(3, 2);
        assert_eq!(field.dims(), (3, 2, 1));
        for (d, q) in field.directors().iter().zip(field.tensors()) {
            assert_relative_eq!(*d, Vec3::z(), epsilon = 1e-12);
            assert_relative_eq!(q.trace(), 0.0, epsilon = 1e-15);
            assert_relative_eq!(q[(2, 2)], 2.0 / 3.0);
        }
    }

    #[test]
    fn test_flat_layer_potential() {
        // Φ = x² - y² on a single layer: Hessian diag(2, -2, 0) is already trace-free
        let layer = ScalarGrid::from_fn(8, 8, |x, y| (x * x) as f64 - (y * y) as f64);
        let field = TidalField::from_potential_2d(
            &layer,
            BoundaryPolicy::Periodic,
            &GridSpacing::default(),
        );
        let q = field.tensor(4, 4, 0);
        assert_relative_eq!(q[(0, 0)], 2.0, epsilon = 1e-9);
        assert_relative_eq!(q[(1, 1)], -2.0, epsilon = 1e-9);
        assert_relative_eq!(q[(2, 2)], 0.0, epsilon = 1e-9);
        assert_relative_eq!(field.director(4, 4, 0).norm(), 1.0, epsilon = 1e-12);
    }
}
