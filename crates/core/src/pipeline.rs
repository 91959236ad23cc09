//! File-to-file synthesis runner
//!
//! Reads `Σ` from an `.npy` container, synthesizes with a configuration
//! record (or defaults), and writes the weight, source, and cutoff fields as
//! `{prefix}_W.npy`, `{prefix}_S.npy`, and `{prefix}_wcut.npy`.

use crate::config::SynthesisConfig;
use crate::error::FieldResult;
use crate::grid::ScalarGrid;
use crate::io::{read_grid, write_grid};
use crate::solver::{synthesize, ProfilerScope};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Paths written by one [`FieldSynthesis::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOutputs {
    /// Transmissivity weight `W`
    pub weight: PathBuf,
    /// Source field `S`
    pub source: PathBuf,
    /// Cutoff field `ω_cut`
    pub cutoff: PathBuf,
}

/// One input grid, one parameter record, one output directory
#[derive(Debug, Clone)]
pub struct FieldSynthesis {
    input: PathBuf,
    params: Option<PathBuf>,
    out_dir: PathBuf,
    prefix: String,
    alpha: Option<f64>,
    beta: Option<f64>,
}

impl FieldSynthesis {
    /// Runner reading `input` and writing into `out_dir`
    ///
    /// The output prefix defaults to the input's file stem.
    pub fn new(input: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let prefix = input
            .file_stem()
            .map_or_else(|| "field".to_string(), |s| s.to_string_lossy().into_owned());
        Self {
            input,
            params: None,
            out_dir: out_dir.into(),
            prefix,
            alpha: None,
            beta: None,
        }
    }

    /// Configuration record to load; defaults apply if it is absent
    pub fn with_params(mut self, params: impl Into<PathBuf>) -> Self {
        self.params = Some(params.into());
        self
    }

    /// Output file prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Override `alpha` after the record is loaded
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Override `beta` after the record is loaded
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = Some(beta);
        self
    }

    /// Effective configuration: record or defaults, then overrides
    pub fn config(&self) -> SynthesisConfig {
        let mut config = self
            .params
            .as_deref()
            .map_or_else(SynthesisConfig::default, SynthesisConfig::load_or_default);
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(beta) = self.beta {
            config.beta = beta;
        }
        config
    }

    fn output_path(&self, suffix: &str) -> PathBuf {
        self.out_dir.join(format!("{}_{suffix}.npy", self.prefix))
    }

    /// Run the synthesis and write all outputs
    ///
    /// Either all three outputs are in place afterwards or none of them is.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read, the effective
    /// configuration is invalid, or an output cannot be written.
    pub fn run(&self) -> FieldResult<SynthesisOutputs> {
        let _p = ProfilerScope::new("field synthesis run");
        let config = self.config();
        let sigma = read_grid(&self.input)?;
        info!(
            "Loaded {}x{} density from {}",
            sigma.height(),
            sigma.width(),
            self.input.display()
        );

        let fields = synthesize(&sigma, &config)?;

        fs::create_dir_all(&self.out_dir)?;
        let outputs = SynthesisOutputs {
            weight: self.output_path("W"),
            source: self.output_path("S"),
            cutoff: self.output_path("wcut"),
        };
        commit_outputs(&[
            (&outputs.weight, &fields.weight),
            (&outputs.source, &fields.source),
            (&outputs.cutoff, &fields.omega_cut),
        ])?;

        info!("Wrote W, S, and wcut to {}", self.out_dir.display());
        Ok(outputs)
    }
}

/// Sibling path an output is written to before it is moved into place
fn staging_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Could not remove {}: {}", path.display(), e);
            }
        }
    }
}

/// Write every grid to a staging file, then rename all of them into place
///
/// On any failure the staged files and the already renamed targets are
/// removed.
fn commit_outputs(targets: &[(&PathBuf, &ScalarGrid)]) -> FieldResult<()> {
    let staged: Vec<PathBuf> = targets.iter().map(|(t, _)| staging_path(t)).collect();

    for (tmp, (_, grid)) in staged.iter().zip(targets) {
        if let Err(e) = write_grid(tmp, grid) {
            discard(&staged);
            return Err(e);
        }
    }

    for (i, (tmp, (target, _))) in staged.iter().zip(targets).enumerate() {
        if let Err(e) = fs::rename(tmp, target) {
            let placed: Vec<PathBuf> = targets[..i].iter().map(|(t, _)| (*t).clone()).collect();
            discard(&placed);
            discard(&staged[i..]);
            return Err(e.into());
        }
    }
    Ok(())
}
