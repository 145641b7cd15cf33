use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use protprep::ops::{SolvateConfig, solvate_file, solvated_output_path};

use crate::commands::run_with_spinner;

/// Surrounds the structure with a grid of randomly oriented waters.
#[derive(Debug, Args)]
pub struct SolvateArgs {
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
    /// Output path. Defaults to `<stem>_water.pdb` beside the input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Margin (Å) added around the solute bounding box.
    #[arg(long, default_value_t = 5.0)]
    pub margin: f64,
    /// Water grid spacing (Å).
    #[arg(long, default_value_t = 2.75)]
    pub spacing: f64,
    /// Minimum distance (Å) between a water oxygen and any solute atom.
    #[arg(long, default_value_t = 2.2)]
    pub cutoff: f64,
    /// Chain identifier written on the waters.
    #[arg(long, value_name = "ID", default_value_t = 'A')]
    pub chain_id: char,
    /// Random seed for reproducible orientations.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,
}

impl SolvateArgs {
    fn config(&self) -> SolvateConfig {
        SolvateConfig {
            margin: self.margin,
            spacing: self.spacing,
            cutoff: self.cutoff,
            chain_id: self.chain_id,
            rng_seed: self.seed,
        }
    }
}

pub fn run(args: &SolvateArgs) -> Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| solvated_output_path(&args.input));
    let config = args.config();

    let waters = run_with_spinner("Placing waters", || {
        solvate_file(&args.input, &output, &config)
            .with_context(|| format!("Failed to solvate {}", args.input.display()))
    })?;

    println!("{} ({} waters)", output.display(), waters);
    Ok(())
}
