//! Error types for field synthesis
//!
//! Degenerate numerics (zero gradient, zero radius, zero median) are never
//! errors: they are floored or replaced by documented defaults. Everything
//! reported here is fatal to the call that produced it.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for field synthesis operations
pub type FieldResult<T> = Result<T, FieldError>;

/// Errors that can occur while synthesizing or persisting fields
#[derive(Error, Debug)]
pub enum FieldError {
    /// Two grids combined elementwise have different shapes
    #[error("Shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Operation that detected the mismatch
        context: &'static str,
        /// Shape of the reference operand
        expected: Vec<usize>,
        /// Shape of the offending operand
        actual: Vec<usize>,
    },

    /// Buffer length does not match the declared shape
    #[error("Data length {len} does not match shape {shape:?}")]
    LengthMismatch {
        /// Declared shape
        shape: Vec<usize>,
        /// Actual number of values
        len: usize,
    },

    /// Configuration value outside its admissible range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration record could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Binary array container is malformed or holds an unsupported layout
    #[error("Malformed array container {path}: {reason}")]
    Container {
        /// File being read
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Underlying filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FieldError {
    /// Build a shape mismatch error for two 2D shapes `(height, width)`
    pub fn shape_2d(
        context: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        Self::ShapeMismatch {
            context,
            expected: vec![expected.0, expected.1],
            actual: vec![actual.0, actual.1],
        }
    }

    /// Build a container error for `path`
    pub fn container(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Container {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = FieldError::shape_2d("compose", (4, 4), (4, 5));
        let msg = err.to_string();
        assert!(msg.contains("compose"));
        assert!(msg.contains("[4, 4]"));
        assert!(msg.contains("[4, 5]"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: FieldError = io_err.into();
        assert!(matches!(err, FieldError::Io(_)));
    }
}
