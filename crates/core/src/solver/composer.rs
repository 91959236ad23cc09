//! Source and transmissivity composition
//!
//! ```text
//! W = exp(-α Σ)        transmissivity, in (0, 1] for Σ ≥ 0, α ≥ 0
//! S = δ · p · G        source, zero wherever p is zero
//! ```

use crate::error::FieldResult;
use crate::grid::ScalarGrid;

/// Terminal output pair of the synthesis pipeline
#[derive(Debug, Clone)]
pub struct ComposedFields {
    /// Source field `S`
    pub source: ScalarGrid,
    /// Transmissivity weight `W`
    pub weight: ScalarGrid,
}

/// Attenuation weight `W = exp(-α Σ)`
///
/// Uses the raw density, so cells with `Σ < 0` get `W > 1`; inputs are
/// expected to be densities.
///
/// # Example
///
/// ```
/// use field_synth_core::grid::ScalarGrid;
/// use field_synth_core::solver::composer::attenuation_weight;
///
/// let sigma = ScalarGrid::from_vec(2, 1, vec![0.0, 1.0]).unwrap();
/// let w = attenuation_weight(&sigma, 0.5);
/// assert_eq!(w.get(0, 0), 1.0);
/// assert_eq!(w.get(1, 0), (-0.5_f64).exp());
/// ```
#[must_use]
pub fn attenuation_weight(sigma: &ScalarGrid, alpha: f64) -> ScalarGrid {
    sigma.map(|s| (-alpha * s).exp())
}

/// Source field `S = δ · p · G`
///
/// # Errors
///
/// Returns a shape mismatch if the three factors disagree in shape.
pub fn source_field(
    shell: &ScalarGrid,
    projection: &ScalarGrid,
    kernel: &ScalarGrid,
) -> FieldResult<ScalarGrid> {
    shell
        .zip_map(projection, "source composition", |d, p| d * p)?
        .zip_map(kernel, "source composition", |dp, g| dp * g)
}

/// Pair a source field with a precomputed weight
///
/// # Errors
///
/// Returns a shape mismatch if any input disagrees with `shell`.
pub fn compose(
    shell: &ScalarGrid,
    projection: &ScalarGrid,
    kernel: &ScalarGrid,
    weight: ScalarGrid,
) -> FieldResult<ComposedFields> {
    shell.ensure_same_shape(&weight, "weight composition")?;
    let source = source_field(shell, projection, kernel)?;
    Ok(ComposedFields { source, weight })
}

/// Density augmented by the shell source, `ρ_eff = ρ + α_esc · δ`
///
/// # Errors
///
/// Returns a shape mismatch if `rho` and `shell` differ in shape.
pub fn boundary_density(
    rho: &ScalarGrid,
    shell: &ScalarGrid,
    alpha_esc: f64,
) -> FieldResult<ScalarGrid> {
    rho.zip_map(shell, "boundary density", |r, s| r + alpha_esc * s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldError;

    #[test]
    fn test_weight_monotone_in_alpha() {
        let sigma = ScalarGrid::from_fn(6, 6, |x, y| (x * y) as f64 * 0.3);
        let alphas = [0.0, 0.1, 0.5, 1.0, 4.0];
        for pair in alphas.windows(2) {
            let lo = attenuation_weight(&sigma, pair[0]);
            let hi = attenuation_weight(&sigma, pair[1]);
            for (&a, &b) in lo.as_slice().iter().zip(hi.as_slice()) {
                assert!(b <= a, "weight increased from {a} to {b}");
            }
        }
    }

    #[test]
    fn test_weight_bounds() {
        let sigma = ScalarGrid::from_fn(4, 4, |x, _| x as f64 * 10.0);
        let w = attenuation_weight(&sigma, 2.0);
        assert!(w.as_slice().iter().all(|&v| v > 0.0 && v <= 1.0));
        assert!(attenuation_weight(&sigma, 0.0)
            .as_slice()
            .iter()
            .all(|&v| v == 1.0));
    }

    #[test]
    fn test_source_is_zero_where_projection_is_zero() {
        let shell = ScalarGrid::with_value(3, 1, 2.0);
        let projection = ScalarGrid::from_vec(3, 1, vec![0.0, 0.5, 1.0]).unwrap();
        let kernel = ScalarGrid::with_value(3, 1, 1.5);
        let source = source_field(&shell, &projection, &kernel).unwrap();
        assert_eq!(source.as_slice(), &[0.0, 1.5, 3.0]);
    }

    #[test]
    fn test_compose_rejects_mismatched_weight() {
        let shell = ScalarGrid::new(4, 4);
        let weight = ScalarGrid::new(4, 3);
        let err = compose(&shell, &shell.clone(), &shell.clone(), weight).unwrap_err();
        assert!(matches!(
            err,
            FieldError::ShapeMismatch {
                context: "weight composition",
                ..
            }
        ));
    }

    #[test]
    fn test_boundary_density() {
        let rho = ScalarGrid::with_value(2, 2, 1.0);
        let shell = ScalarGrid::with_value(2, 2, 0.5);
        let eff = boundary_density(&rho, &shell, 4.0).unwrap();
        assert!(eff.as_slice().iter().all(|&v| v == 3.0));
        assert!(boundary_density(&rho, &ScalarGrid::new(3, 2), 1.0).is_err());
    }
}
