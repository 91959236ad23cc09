//! Dense 3D scalar grid for volumetric inputs (potentials, densities)

use super::ScalarGrid;
use crate::error::{FieldError, FieldResult};
use rayon::prelude::*;

/// 3D scalar field, stored `z`-major: index `(z * ny + y) * nx + x`
///
/// Shape order is `(nz, ny, nx)`, matching the array container layout.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeGrid {
    data: Vec<f64>,
    nx: usize,
    ny: usize,
    nz: usize,
}

impl VolumeGrid {
    /// Wrap an existing buffer in `(nz, ny, nx)` order
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::LengthMismatch`] if the buffer length is wrong.
    pub fn from_vec(nx: usize, ny: usize, nz: usize, data: Vec<f64>) -> FieldResult<Self> {
        if data.len() != nx * ny * nz {
            return Err(FieldError::LengthMismatch {
                shape: vec![nz, ny, nx],
                len: data.len(),
            });
        }
        Ok(Self { data, nx, ny, nz })
    }

    /// Build a volume by evaluating `f(x, y, z)` at every voxel
    ///
    /// Rows are filled in parallel.
    #[must_use]
    pub fn from_fn<F>(nx: usize, ny: usize, nz: usize, f: F) -> Self
    where
        F: Fn(usize, usize, usize) -> f64 + Sync,
    {
        let mut data = vec![0.0; nx * ny * nz];
        if nx > 0 && ny > 0 {
            data.par_chunks_mut(nx).enumerate().for_each(|(row, cells)| {
                let (z, y) = (row / ny, row % ny);
                for (x, cell) in cells.iter_mut().enumerate() {
                    *cell = f(x, y, z);
                }
            });
        }
        Self { data, nx, ny, nz }
    }

    /// Lift a 2D grid to a single-layer volume (`nz = 1`)
    #[must_use]
    pub fn from_layer(layer: &ScalarGrid) -> Self {
        Self {
            data: layer.as_slice().to_vec(),
            nx: layer.width(),
            ny: layer.height(),
            nz: 1,
        }
    }

    /// Dimensions as `(nx, ny, nz)`
    #[must_use]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    /// Shape as `(nz, ny, nx)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.nz, self.ny, self.nx)
    }

    /// Number of voxels
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when any dimension is zero
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat index of voxel `(x, y, z)`
    #[inline]
    #[must_use]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.ny + y) * self.nx + x
    }

    /// Value at voxel `(x, y, z)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> f64 {
        assert!(
            x < self.nx && y < self.ny && z < self.nz,
            "Coordinates out of bounds"
        );
        self.data[self.index(x, y, z)]
    }

    /// Set voxel `(x, y, z)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f64) {
        assert!(
            x < self.nx && y < self.ny && z < self.nz,
            "Coordinates out of bounds"
        );
        let idx = self.index(x, y, z);
        self.data[idx] = value;
    }

    /// Row-major voxel data
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Copy out layer `z` as a 2D grid
    ///
    /// # Panics
    ///
    /// Panics if `z` is out of bounds
    #[must_use]
    pub fn layer(&self, z: usize) -> ScalarGrid {
        assert!(z < self.nz, "Layer out of bounds");
        let start = z * self.nx * self.ny;
        let nx = self.nx;
        ScalarGrid::from_fn(self.nx, self.ny, |x, y| self.data[start + y * nx + x])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_indexing() {
        let vol = VolumeGrid::from_fn(3, 2, 4, |x, y, z| (100 * z + 10 * y + x) as f64);
        assert_eq!(vol.shape(), (4, 2, 3));
        assert_eq!(vol.get(2, 1, 3), 312.0);
        assert_eq!(vol.as_slice()[vol.index(1, 0, 2)], 201.0);
    }

    #[test]
    fn test_layer_round_trip() {
        let layer = ScalarGrid::from_fn(3, 2, |x, y| (x + 10 * y) as f64);
        let vol = VolumeGrid::from_layer(&layer);
        assert_eq!(vol.dims(), (3, 2, 1));
        assert_eq!(vol.layer(0), layer);
    }

    #[test]
    fn test_from_vec_length_check() {
        assert!(VolumeGrid::from_vec(2, 2, 2, vec![0.0; 7]).is_err());
    }
}
