//! Vector and matrix aliases for per-cell tensor work.

use nalgebra::{Matrix3, Vector3};

/// 3D vector type for directors and gradients.
///
/// A simple alias for `nalgebra::Vector3<f64>`; field synthesis runs in
/// double precision throughout.
pub type Vec3 = Vector3<f64>;

/// Symmetric 3×3 tensor stored as a full matrix.
pub type Tensor3 = Matrix3<f64>;
