use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use protprep::io::ResidueContext;
use protprep::ops::{isolate_ligand_file, protonate_ligand_file};
use protprep::services::NativeToolkit;

use crate::commands::run_with_spinner;

/// Extracts one ligand residue into `lig_<pdb_id>.pdb` and adds its hydrogens.
#[derive(Debug, Args)]
pub struct LigandArgs {
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
    /// Identifier used to name the output file.
    #[arg(long, value_name = "ID")]
    pub pdb_id: String,
    #[arg(long, value_name = "ID")]
    pub chain: String,
    /// Residue name of the ligand.
    #[arg(long, value_name = "RES_NAME")]
    pub ligand: String,
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,
    /// Write the heavy-atom ligand without adding hydrogens.
    #[arg(long)]
    pub skip_hydrogens: bool,
    /// Open Babel executable used to place hydrogens.
    #[arg(long, value_name = "PROGRAM", default_value = "obabel")]
    pub obabel: PathBuf,
}

pub fn run(args: &LigandArgs) -> Result<()> {
    let context = ResidueContext::new_default();
    let output = run_with_spinner("Isolating ligand", || {
        isolate_ligand_file(
            &args.input,
            &args.out_dir,
            args.pdb_id.trim(),
            &args.chain,
            &args.ligand,
            &context,
        )
        .with_context(|| {
            format!(
                "Failed to isolate {} on chain {} from {}",
                args.ligand,
                args.chain,
                args.input.display()
            )
        })
    })?;

    if !args.skip_hydrogens {
        let mut toolkit = NativeToolkit::new().with_hydrogen_program(Some(args.obabel.clone()));
        run_with_spinner("Adding ligand hydrogens", || {
            protonate_ligand_file(&mut toolkit, &output)
                .with_context(|| format!("Failed to add hydrogens to {}", output.display()))
        })?;
    }

    println!("{}", output.display());
    Ok(())
}
