//! kasane-batch: headless pipeline runner.
//!
//! Loads an image, applies a parameter file (JSON, same shape the
//! desktop app saves), runs the full stage chain once, and writes the
//! sink frame to disk. Useful for scripting the exact processing the
//! GUI previews.
//!
//! # Usage
//!
//! ```text
//! kasane-batch input.png -o output.png --params params.json
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use kasane_pipeline::{Pipeline, PipelineParams};
use tracing_subscriber::EnvFilter;

/// Run the kasane image pipeline without the GUI.
#[derive(Parser)]
#[command(name = "kasane-batch", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Path for the processed output image; the extension selects the
    /// encoder.
    #[arg(short, long)]
    output: PathBuf,

    /// JSON parameter file; stages not named in it use their defaults.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Print the effective parameters as JSON before processing.
    #[arg(long)]
    print_params: bool,
}

fn load_params(path: &Path) -> Result<PipelineParams, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    serde_json::from_str(&json).map_err(|e| format!("Error parsing {}: {e}", path.display()))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let params = match cli.params.as_deref().map(load_params) {
        Some(Ok(params)) => params,
        Some(Err(msg)) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
        None => PipelineParams::default(),
    };

    if cli.print_params {
        match serde_json::to_string_pretty(&params) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing parameters: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let mut pipeline = Pipeline::new();
    pipeline.set_params(params);

    if let Err(e) = pipeline.load_image(&cli.input) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    pipeline.run();

    if let Err(e) = pipeline.save_output(&cli.output) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    eprintln!("Wrote {}", cli.output.display());
    ExitCode::SUCCESS
}
