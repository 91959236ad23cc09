//! Field synthesis solver
//!
//! Turns an effective surface density `Σ` into a source field `S` and a
//! transmissivity weight `W`. The stages run in a fixed order, each a pure
//! function of the previous ones:
//!
//! ```text
//! Σ ──► ω_cut ──► ∇ω_cut ──► H ──► δ ─────┐
//!          │         │                    ├──► S = δ · p · G
//!          └► ω*     └► n ─► cosθ ─► p, G ┘
//! Σ ──────────────────────────────────────────► W = exp(-α Σ)
//! ```
//!
//! # Example
//!
//! ```
//! use field_synth_core::grid::ScalarGrid;
//! use field_synth_core::solver::synthesize;
//! use field_synth_core::SynthesisConfig;
//!
//! let sigma = ScalarGrid::from_fn(16, 16, |x, y| {
//!     let dx = x as f64 - 7.5;
//!     let dy = y as f64 - 7.5;
//!     (-(dx * dx + dy * dy) / 20.0).exp()
//! });
//! let fields = synthesize(&sigma, &SynthesisConfig::with_kernel(0.5, 0.3)).unwrap();
//! assert!(fields.source.as_slice().iter().all(|s| s.is_finite() && *s >= 0.0));
//! ```

pub mod composer;
pub mod directional;
pub mod gradient;
pub mod profiler;
pub mod scale;
pub mod shell;
pub mod structure_tensor;
pub mod tidal;

// Re-exports
pub use composer::{attenuation_weight, boundary_density, compose, source_field, ComposedFields};
pub use directional::{
    angular_kernel, angular_kernel_field, beta_of_chi, directional_fields, lambert_forward,
    outward_normal, radial_unit_field, DirectionalFields,
};
pub use gradient::{gradient_2d, gradient_3d, partial_3d, Axis, BoundaryPolicy};
pub use profiler::ProfilerScope;
pub use scale::{cutoff_field, estimate_scale, ScaleEstimate, ScaleParams, DEFAULT_EPSILON};
pub use shell::{reference_cutoff, shell_weight, ShellWidth, FALLBACK_REFERENCE};
pub use structure_tensor::{anisotropy_strengths, structure_tensor, StructureTensorField};
pub use tidal::{principal_director, trace_free, TidalField};

use crate::config::SynthesisConfig;
use crate::core_types::count_non_finite;
use crate::error::FieldResult;
use crate::grid::{ScalarGrid, VectorField2D};
use tracing::{debug, info};

/// Every intermediate and terminal field of one synthesis call
#[derive(Debug, Clone)]
pub struct SynthesizedFields {
    /// `ω_cut = sqrt(max(Σ, 0))`
    pub omega_cut: ScalarGrid,
    /// Thickness scale `H`
    pub thickness: ScalarGrid,
    /// Reference cutoff `ω*`
    pub omega_star: f64,
    /// Shell weight `δ`
    pub shell: ScalarGrid,
    /// Unit outward normal `n`
    pub normal: VectorField2D,
    /// `cosθ = n · r̂`
    pub cos_angle: ScalarGrid,
    /// `p = max(cosθ, 0)`
    pub projection: ScalarGrid,
    /// Angular kernel `G(θ; β)`
    pub kernel: ScalarGrid,
    /// Source field `S`
    pub source: ScalarGrid,
    /// Transmissivity weight `W`
    pub weight: ScalarGrid,
}

impl SynthesizedFields {
    /// Drop the intermediates and keep `S` and `W`
    #[must_use]
    pub fn into_composed(self) -> ComposedFields {
        ComposedFields {
            source: self.source,
            weight: self.weight,
        }
    }
}

/// Run the full synthesis pipeline on one density grid
///
/// Deterministic: the same `sigma` and `config` always give bit-identical
/// output. Non-finite input values are not filtered and propagate into the
/// cells whose stencils touch them.
///
/// # Errors
///
/// Returns [`crate::FieldError::InvalidConfig`] if `config` fails
/// [`SynthesisConfig::validate`].
pub fn synthesize(sigma: &ScalarGrid, config: &SynthesisConfig) -> FieldResult<SynthesizedFields> {
    config.validate()?;
    let _total = ProfilerScope::new("synthesize");
    let eps = config.epsilon;

    let non_finite = count_non_finite(sigma.as_slice());
    if non_finite > 0 {
        debug!(
            "Density has {} non-finite cells; they propagate to neighbouring stencils",
            non_finite
        );
    }

    let scale = {
        let _p = ProfilerScope::new("scale estimation");
        estimate_scale(sigma, &config.scale_params())
    };

    let omega_star = reference_cutoff(&scale.omega_cut);
    let shell = {
        let _p = ProfilerScope::new("shell weight");
        shell_weight(
            &scale.omega_cut,
            &scale.thickness,
            omega_star,
            config.shell_width,
            eps,
        )
    };

    let directional = {
        let _p = ProfilerScope::new("directional kernel");
        directional_fields(&scale.gradient, &scale.gradient_norm, eps)?
    };
    let kernel = angular_kernel_field(&directional.cos_angle, config.beta);

    let composed = {
        let _p = ProfilerScope::new("composition");
        let weight = attenuation_weight(sigma, config.alpha);
        compose(&shell, &directional.projection, &kernel, weight)?
    };

    info!(
        "Synthesized {}x{} grid (omega* = {:.6e}, alpha = {}, beta = {})",
        sigma.height(),
        sigma.width(),
        omega_star,
        config.alpha,
        config.beta
    );

    Ok(SynthesizedFields {
        omega_cut: scale.omega_cut,
        thickness: scale.thickness,
        omega_star,
        shell,
        normal: directional.normal,
        cos_angle: directional.cos_angle,
        projection: directional.projection,
        kernel,
        source: composed.source,
        weight: composed.weight,
    })
}
