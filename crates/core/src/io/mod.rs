//! Persistence of grids

pub mod npy;

pub use npy::{read_grid, read_volume, write_grid, write_volume};
