//! Field Synthesis Core Library
//!
//! Synthesizes a source field `S` and a transmissivity weight `W` from a 2D
//! effective surface density `Σ` using only local differential operators:
//! a cutoff field `ω_cut = sqrt(Σ)`, its thickness scale, a soft shell
//! around a reference level, and a one-sided angular kernel against the
//! radial direction. A tidal-tensor director field and a structure-tensor
//! anisotropy field are provided for volumetric potentials and densities.
//!
//! ## Layout
//!
//! - [`grid`]: scalar, vector, and volume containers
//! - [`solver`]: gradient, scale, shell, directional, composer, and tensor stages
//! - [`config`]: the JSON parameter record
//! - [`io`]: `.npy` persistence
//! - [`pipeline`]: file-to-file runner

// Core types and utilities
pub mod core_types;
pub mod error;

// Fields and their operators
pub mod grid;
pub mod solver;

// Configuration and persistence
pub mod config;
pub mod io;
pub mod pipeline;

// Re-export core types
pub use core_types::{Tensor3, Vec3};
pub use error::{FieldError, FieldResult};

// Re-export grids and the pipeline surface
pub use config::SynthesisConfig;
pub use grid::{GridSpacing, ScalarGrid, VectorField2D, VolumeGrid};
pub use pipeline::{FieldSynthesis, SynthesisOutputs};
pub use solver::{
    synthesize, BoundaryPolicy, ComposedFields, ShellWidth, StructureTensorField,
    SynthesizedFields, TidalField,
};
