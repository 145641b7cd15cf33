use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use protprep::ops::protonate_file;
use protprep::services::NativeToolkit;

use crate::commands::run_with_spinner;

/// Removes solvent and adds polar hydrogens in place, keeping any pose metadata on top.
#[derive(Debug, Args)]
pub struct HydroArgs {
    /// Structure rewritten in place.
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
    /// Open Babel executable used to place hydrogens.
    #[arg(long, value_name = "PROGRAM", default_value = "obabel")]
    pub obabel: PathBuf,
}

pub fn run(args: &HydroArgs) -> Result<()> {
    let mut toolkit = NativeToolkit::new().with_hydrogen_program(Some(args.obabel.clone()));

    let outcome = run_with_spinner("Adding hydrogens", || {
        protonate_file(&mut toolkit, &args.input)
            .with_context(|| format!("Failed to add hydrogens to {}", args.input.display()))
    })?;

    println!(
        "{} (solvent atoms removed: {}, nonpolar hydrogens removed: {}{})",
        args.input.display(),
        outcome.solvent_removed,
        outcome.nonpolar_removed,
        if outcome.metadata_injected {
            ", metadata restored"
        } else {
            ""
        }
    );
    Ok(())
}
