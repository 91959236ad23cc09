//! Grid containers for scalar, vector, and volumetric fields

pub mod scalar_grid;
pub mod spacing;
pub mod vector_field;
pub mod volume;

pub use scalar_grid::ScalarGrid;
pub use spacing::GridSpacing;
pub use vector_field::VectorField2D;
pub use volume::VolumeGrid;
