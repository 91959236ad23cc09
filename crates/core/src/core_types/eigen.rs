//! Symmetric 3×3 eigen decomposition with a bounded iteration count

use super::vec3::{Tensor3, Vec3};
use nalgebra::SymmetricEigen;
use std::cmp::Ordering;

/// Iteration cap for the QR sweeps; 3×3 inputs converge in a handful
const MAX_EIGEN_ITERATIONS: usize = 256;

/// Eigenvalues sorted descending, with matching unit eigenvectors as columns
///
/// Returns `None` if the tensor has non-finite entries or the iteration does
/// not converge.
#[must_use]
pub fn symmetric_eigen_descending(tensor: &Tensor3) -> Option<(Vec3, Tensor3)> {
    if tensor.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let eigen = SymmetricEigen::try_new(*tensor, f64::EPSILON, MAX_EIGEN_ITERATIONS)?;

    let mut order = [0_usize, 1, 2];
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[b]
            .partial_cmp(&eigen.eigenvalues[a])
            .unwrap_or(Ordering::Equal)
    });

    let values = Vec3::new(
        eigen.eigenvalues[order[0]],
        eigen.eigenvalues[order[1]],
        eigen.eigenvalues[order[2]],
    );
    let mut vectors = Tensor3::zeros();
    for (col, &src) in order.iter().enumerate() {
        let v = eigen.eigenvectors.column(src);
        let norm = v.norm();
        if norm > 0.0 {
            vectors.set_column(col, &(v / norm));
        }
    }
    Some((values, vectors))
}

/// Flip an axis so its largest-magnitude component is positive
///
/// Eigenvectors are only defined up to sign; this makes the choice
/// deterministic.
#[must_use]
pub fn canonical_axis(v: Vec3) -> Vec3 {
    let dominant = v.iamax();
    if v[dominant] < 0.0 {
        -v
    } else {
        v
    }
}
