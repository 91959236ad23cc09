//! Physical cell spacing along each grid axis

use serde::{Deserialize, Serialize};

/// Cell size along each axis, in arbitrary but consistent length units
///
/// Defaults to unit spacing, under which derivatives are per-pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpacing {
    /// Spacing along columns
    pub dx: f64,
    /// Spacing along rows
    pub dy: f64,
    /// Spacing between layers
    pub dz: f64,
}

impl Default for GridSpacing {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl GridSpacing {
    /// Same spacing on every axis
    #[must_use]
    pub const fn uniform(step: f64) -> Self {
        Self {
            dx: step,
            dy: step,
            dz: step,
        }
    }

    /// True if every spacing is finite and strictly positive
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.dx, self.dy, self.dz]
            .iter()
            .all(|s| s.is_finite() && *s > 0.0)
    }
}
