//! Synthesis configuration record
//!
//! The record is a small JSON object. Every key is optional:
//!
//! ```json
//! { "alpha": 0.5, "beta": 0.3 }
//! ```
//!
//! Unknown keys are ignored, so parameter files shared with other tools load
//! as-is.

use crate::error::{FieldError, FieldResult};
use crate::grid::GridSpacing;
use crate::solver::gradient::BoundaryPolicy;
use crate::solver::scale::{ScaleParams, DEFAULT_EPSILON};
use crate::solver::shell::ShellWidth;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Parameters for one synthesis call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Attenuation strength in `W = exp(-α Σ)`
    pub alpha: f64,
    /// Angular anisotropy in `G(θ; β)`, expected in `[-1, 1]`
    pub beta: f64,
    /// Floor for magnitudes and ratios
    pub epsilon: f64,
    /// Edge treatment for every finite-difference stencil
    pub boundary: BoundaryPolicy,
    /// Cell spacing
    pub spacing: GridSpacing,
    /// Shell width mode
    pub shell_width: ShellWidth,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            beta: 0.0,
            epsilon: DEFAULT_EPSILON,
            boundary: BoundaryPolicy::Periodic,
            spacing: GridSpacing::default(),
            shell_width: ShellWidth::Adaptive,
        }
    }
}

impl SynthesisConfig {
    /// Config with the given kernel parameters and defaults elsewhere
    #[must_use]
    pub fn with_kernel(alpha: f64, beta: f64) -> Self {
        Self {
            alpha,
            beta,
            ..Self::default()
        }
    }

    /// Load a configuration record, failing on any I/O or parse error
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Io`] if the file cannot be read and
    /// [`FieldError::Config`] if it is not a valid record.
    pub fn load<P: AsRef<Path>>(path: P) -> FieldResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Load a configuration record, falling back to defaults
    ///
    /// A missing file is the normal no-configuration case. A file that exists
    /// but cannot be read or parsed is logged and also yields defaults, which
    /// makes the kernel degenerate to `W ≡ 1`, `G ≡ 1`.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No configuration at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Configuration at {} is unreadable ({}), using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the record as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> FieldResult<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check parameter ranges
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidConfig`] for non-finite `alpha`/`beta`,
    /// `beta ≤ -2` (the angular kernel's denominator vanishes), a non-positive
    /// `epsilon`, or a non-positive spacing.
    pub fn validate(&self) -> FieldResult<()> {
        if !self.alpha.is_finite() {
            return Err(FieldError::InvalidConfig(format!(
                "alpha must be finite, got {}",
                self.alpha
            )));
        }
        if !self.beta.is_finite() || self.beta <= -2.0 {
            return Err(FieldError::InvalidConfig(format!(
                "beta must be finite and greater than -2, got {}",
                self.beta
            )));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(FieldError::InvalidConfig(format!(
                "epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }
        if !self.spacing.is_valid() {
            return Err(FieldError::InvalidConfig(format!(
                "spacing must be finite and positive, got {:?}",
                self.spacing
            )));
        }
        Ok(())
    }

    /// Parameters for the scale estimator
    #[must_use]
    pub fn scale_params(&self) -> ScaleParams {
        ScaleParams {
            epsilon: self.epsilon,
            boundary: self.boundary,
            spacing: self.spacing,
        }
    }
}
