use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use protprep::ops::{extract_metadata_file, inject_metadata};

/// Prints the scoring remarks of a docked pose, or copies them to the top of another file.
#[derive(Debug, Args)]
pub struct MetadataArgs {
    /// Docked pose file to read the first model's remarks from.
    #[arg(long, value_name = "FILE")]
    pub from: PathBuf,
    /// File that receives the remarks at its top.
    #[arg(long, value_name = "FILE")]
    pub into: Option<PathBuf>,
}

pub fn run(args: &MetadataArgs) -> Result<()> {
    let metadata = extract_metadata_file(&args.from)
        .with_context(|| format!("Failed to read metadata from {}", args.from.display()))?;

    match &args.into {
        Some(target) => {
            inject_metadata(target, &metadata)
                .with_context(|| format!("Failed to write metadata into {}", target.display()))?;
            println!("{} ({} lines)", target.display(), metadata.len());
        }
        None => {
            for line in metadata.lines() {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
