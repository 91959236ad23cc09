//! Core types and utilities

pub mod eigen;
pub mod stats;
pub mod vec3;

pub use eigen::{canonical_axis, symmetric_eigen_descending};
pub use stats::{count_non_finite, finite_median, finite_quantile};
pub use vec3::{Tensor3, Vec3};
