use clap::Parser;
use field_synth_core::io::read_grid;
use field_synth_core::{FieldSynthesis, ScalarGrid};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Synthesize source and transmissivity fields from a surface density map
#[derive(Parser, Debug)]
#[command(name = "synth-headless")]
#[command(about = "Field synthesis from an effective surface density grid", long_about = None)]
struct Args {
    /// Input density grid (.npy, <f8, 2D)
    #[arg(short, long)]
    input: PathBuf,

    /// JSON parameter record; defaults are used if it is missing or unreadable
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Output directory, created if missing
    #[arg(short, long, default_value = "out")]
    out_dir: PathBuf,

    /// Output file prefix (defaults to the input file stem)
    #[arg(long)]
    prefix: Option<String>,

    /// Override the attenuation strength alpha
    #[arg(short, long)]
    alpha: Option<f64>,

    /// Override the angular anisotropy beta
    #[arg(short, long, allow_negative_numbers = true)]
    beta: Option<f64>,
}

fn report(label: &str, grid: &ScalarGrid) {
    if let Some((lo, hi)) = grid.finite_range() {
        println!("  {label:<5} range [{lo:.6e}, {hi:.6e}]");
    } else {
        println!("  {label:<5} has no finite values");
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut runner = FieldSynthesis::new(&args.input, &args.out_dir);
    if let Some(params) = &args.params {
        runner = runner.with_params(params);
    }
    if let Some(prefix) = &args.prefix {
        runner = runner.with_prefix(prefix.as_str());
    }
    if let Some(alpha) = args.alpha {
        runner = runner.with_alpha(alpha);
    }
    if let Some(beta) = args.beta {
        runner = runner.with_beta(beta);
    }

    let config = runner.config();
    println!("=== Field Synthesis ===\n");
    println!("Input:  {}", args.input.display());
    println!(
        "Kernel: alpha = {}, beta = {}, boundary = {:?}, shell = {:?}\n",
        config.alpha, config.beta, config.boundary, config.shell_width
    );

    let outputs = match runner.run() {
        Ok(outputs) => outputs,
        Err(e) => {
            eprintln!("Synthesis failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("Wrote:");
    for (label, path) in [
        ("W", &outputs.weight),
        ("S", &outputs.source),
        ("wcut", &outputs.cutoff),
    ] {
        println!("  {label:<5} {}", path.display());
        match read_grid(path) {
            Ok(grid) => report(label, &grid),
            Err(e) => eprintln!("  {label:<5} could not be re-read: {e}"),
        }
    }

    ExitCode::SUCCESS
}
