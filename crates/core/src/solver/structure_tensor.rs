//! Gradient structure tensor of a density volume
//!
//! Per voxel `J = ∇ρ ∇ρᵀ`, decomposed into descending eigenvalues and unit
//! eigenvectors. For an unsmoothed gradient `J` has rank one, so the leading
//! eigenvector is the gradient direction and the rest span its normal plane.

use super::gradient::{gradient_3d, BoundaryPolicy};
use crate::core_types::{symmetric_eigen_descending, Tensor3, Vec3};
use crate::grid::{GridSpacing, VolumeGrid};
use rayon::prelude::*;

/// Eigen decomposition of the structure tensor at every voxel
#[derive(Debug, Clone)]
pub struct StructureTensorField {
    /// Eigenvalues, descending; NaN where the gradient is non-finite
    pub eigenvalues: Vec<Vec3>,
    /// Matching unit eigenvectors as columns; zero where undecomposable
    pub eigenvectors: Vec<Tensor3>,
    /// Dimensions as `(nx, ny, nz)`
    pub dims: (usize, usize, usize),
}

/// Structure tensor field of a density volume
#[must_use]
pub fn structure_tensor(
    rho: &VolumeGrid,
    boundary: BoundaryPolicy,
    spacing: &GridSpacing,
) -> StructureTensorField {
    let [gx, gy, gz] = gradient_3d(rho, boundary, spacing);

    let (eigenvalues, eigenvectors): (Vec<Vec3>, Vec<Tensor3>) = (0..rho.len())
        .into_par_iter()
        .map(|i| {
            let g = Vec3::new(gx.as_slice()[i], gy.as_slice()[i], gz.as_slice()[i]);
            let j = g * g.transpose();
            symmetric_eigen_descending(&j)
                .unwrap_or_else(|| (Vec3::repeat(f64::NAN), Tensor3::zeros()))
        })
        .unzip();

    StructureTensorField {
        eigenvalues,
        eigenvectors,
        dims: rho.dims(),
    }
}

/// Anisotropy strengths `b_p = (λ_p - mean λ) / (|mean λ| + ε)`
///
/// The strengths of one voxel sum to zero.
///
/// # Example
///
/// ```
/// use field_synth_core::core_types::Vec3;
/// use field_synth_core::solver::structure_tensor::anisotropy_strengths;
///
/// let b = anisotropy_strengths(&Vec3::new(3.0, 0.0, 0.0), 1e-12);
/// assert!((b[0] - 2.0).abs() < 1e-9);
/// assert!((b.sum()).abs() < 1e-12);
/// ```
#[must_use]
pub fn anisotropy_strengths(eigenvalues: &Vec3, epsilon: f64) -> Vec3 {
    let mean = eigenvalues.mean();
    eigenvalues.map(|l| (l - mean) / (mean.abs() + epsilon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rank_one_along_gradient() {
        // ρ = 2y: gradient (0, 2, 0), J = diag(0, 4, 0)
        let rho = VolumeGrid::from_fn(5, 5, 5, |_, y, _| 2.0 * y as f64);
        let field = structure_tensor(&rho, BoundaryPolicy::Clamp, &GridSpacing::default());
        let (nx, ny, _) = field.dims;
        let i = (2 * ny + 2) * nx + 2;

        let values = field.eigenvalues[i];
        assert_relative_eq!(values[0], 4.0, epsilon = 1e-12);
        assert_relative_eq!(values[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(values[2], 0.0, epsilon = 1e-12);

        let lead = field.eigenvectors[i].column(0).into_owned();
        assert_relative_eq!(lead[1].abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_density_has_zero_spectrum() {
        let rho = VolumeGrid::from_fn(3, 3, 3, |_, _, _| 1.5);
        let field = structure_tensor(&rho, BoundaryPolicy::Periodic, &GridSpacing::default());
        for v in &field.eigenvalues {
            assert_eq!(v.amax(), 0.0);
        }
    }

    #[test]
    fn test_anisotropy_sums_to_zero() {
        for values in [
            Vec3::new(5.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(2.0, -1.0, -4.0),
        ] {
            let b = anisotropy_strengths(&values, 1e-12);
            assert_relative_eq!(b.sum(), 0.0, epsilon = 1e-12);
        }
        let iso = anisotropy_strengths(&Vec3::new(2.0, 2.0, 2.0), 1e-12);
        assert_eq!(iso, Vec3::zeros());
    }
}
