use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use protprep::io::save_fragment;
use protprep::ops::{RetentionSet, clean_output_path, filter_chain};

use crate::commands::{build_name_list, load_structure, run_with_spinner};

/// Keeps one chain plus the hetero groups named on the command line.
#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Raw structure to filter; it is never modified.
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
    /// Output path. Defaults to `rec_<stem>_<chain>_clean.pdb` beside the input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Chain to keep.
    #[arg(long, value_name = "ID")]
    pub chain: String,
    /// Cofactor residue names to keep.
    #[arg(long = "cofactor", value_name = "RES_NAME")]
    pub cofactors: Vec<String>,
    /// Co-substrate residue names to keep.
    #[arg(long = "cosubstrate", value_name = "RES_NAME")]
    pub cosubstrates: Vec<String>,
    /// Metal ion residue names to keep.
    #[arg(long = "metal-ion", value_name = "RES_NAME")]
    pub metal_ions: Vec<String>,
    /// Ligand residue name to keep.
    #[arg(long, value_name = "RES_NAME")]
    pub ligand: Option<String>,
}

impl CleanArgs {
    fn retention(&self) -> RetentionSet {
        RetentionSet {
            cofactors: build_name_list(&self.cofactors),
            cosubstrates: build_name_list(&self.cosubstrates),
            metal_ions: build_name_list(&self.metal_ions),
            ligand: self.ligand.as_ref().map(|l| l.trim().to_ascii_uppercase()),
        }
    }
}

pub fn run(args: &CleanArgs) -> Result<()> {
    let fragment = load_structure(&args.input)?;
    let retain = args.retention();
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| clean_output_path(&args.input, &args.chain));

    let filtered = run_with_spinner("Filtering chain", || {
        Ok(filter_chain(&fragment, &args.chain, &retain))
    })?;
    save_fragment(&output, &filtered)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} ({} of {} atoms kept)",
        output.display(),
        filtered.atom_count(),
        fragment.atom_count()
    );
    Ok(())
}
