//! Dense 2D scalar grid
//!
//! Stores a field as a flat `Vec<f64>` in row-major order (`y * width + x`),
//! matching the `(ny, nx)` layout of the arrays it is loaded from.

use crate::error::{FieldError, FieldResult};
use rayon::prelude::*;

/// 2D scalar field sampled on a uniform pixel grid
///
/// `width` is the number of columns (`nx`) and `height` the number of rows
/// (`ny`). Values may be non-finite; reductions that care mask them.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarGrid {
    data: Vec<f64>,
    width: usize,
    height: usize,
}

impl ScalarGrid {
    /// Create a new grid with given dimensions, initialized to zero
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_value(width, height, 0.0)
    }

    /// Create a new grid with given dimensions, initialized to a value
    ///
    /// # Arguments
    ///
    /// * `width` - Grid width in cells (`nx`)
    /// * `height` - Grid height in cells (`ny`)
    /// * `value` - Initial value for all cells
    #[must_use]
    pub fn with_value(width: usize, height: usize, value: f64) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Wrap an existing row-major buffer
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::LengthMismatch`] if `data.len() != width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<f64>) -> FieldResult<Self> {
        if data.len() != width * height {
            return Err(FieldError::LengthMismatch {
                shape: vec![height, width],
                len: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build a grid by evaluating `f(x, y)` at every cell
    #[must_use]
    pub fn from_fn<F>(width: usize, height: usize, f: F) -> Self
    where
        F: Fn(usize, usize) -> f64 + Sync,
    {
        let mut data = vec![0.0; width * height];
        if width > 0 {
            data.par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| {
                    for (x, cell) in row.iter_mut().enumerate() {
                        *cell = f(x, y);
                    }
                });
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Grid width in cells (`nx`)
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells (`ny`)
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Shape as `(ny, nx)`, the order used by the array container
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when either dimension is zero
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get reference to field data
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Get value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x]
    }

    /// Set value at grid position
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x] = value;
    }

    /// Check that `other` has the same shape
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ShapeMismatch`] naming `context` otherwise.
    pub fn ensure_same_shape(&self, other: &Self, context: &'static str) -> FieldResult<()> {
        if self.shape() == other.shape() {
            Ok(())
        } else {
            Err(FieldError::shape_2d(context, self.shape(), other.shape()))
        }
    }

    /// Apply `f` to every cell, producing a new grid
    #[must_use]
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64 + Sync + Send,
    {
        Self {
            data: self.data.par_iter().map(|&v| f(v)).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Combine two grids cell by cell
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ShapeMismatch`] if the shapes differ; shapes are
    /// never broadcast.
    pub fn zip_map<F>(&self, other: &Self, context: &'static str, f: F) -> FieldResult<Self>
    where
        F: Fn(f64, f64) -> f64 + Sync + Send,
    {
        self.ensure_same_shape(other, context)?;
        Ok(Self {
            data: self
                .data
                .par_iter()
                .zip(other.data.par_iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
            width: self.width,
            height: self.height,
        })
    }

    /// Smallest and largest finite values, `None` if there are none
    #[must_use]
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
