//! 2D vector fields as component grids

use super::ScalarGrid;
use crate::error::FieldResult;

/// Pair of same-shape component grids holding a 2D vector per cell
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField2D {
    /// Component along columns (x, `nx` axis)
    pub x: ScalarGrid,
    /// Component along rows (y, `ny` axis)
    pub y: ScalarGrid,
}

impl VectorField2D {
    /// Pair two component grids
    ///
    /// # Errors
    ///
    /// Returns a shape mismatch if the components differ in shape.
    pub fn new(x: ScalarGrid, y: ScalarGrid) -> FieldResult<Self> {
        x.ensure_same_shape(&y, "vector field components")?;
        Ok(Self { x, y })
    }

    /// Zero vector field of the given shape
    #[must_use]
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            x: ScalarGrid::new(width, height),
            y: ScalarGrid::new(width, height),
        }
    }

    /// Shape as `(ny, nx)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.x.shape()
    }

    /// Per-cell Euclidean norm
    #[must_use]
    pub fn magnitude(&self) -> ScalarGrid {
        ScalarGrid::from_fn(self.x.width(), self.x.height(), |x, y| {
            self.x.get(x, y).hypot(self.y.get(x, y))
        })
    }

    /// Per-cell dot product with another field of the same shape
    ///
    /// # Errors
    ///
    /// Returns a shape mismatch if the fields differ in shape.
    pub fn dot(&self, other: &Self) -> FieldResult<ScalarGrid> {
        let xx = self.x.zip_map(&other.x, "vector dot", |a, b| a * b)?;
        let yy = self.y.zip_map(&other.y, "vector dot", |a, b| a * b)?;
        xx.zip_map(&yy, "vector dot", |a, b| a + b)
    }
}
