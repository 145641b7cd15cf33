use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use protprep::ops::{CombineConfig, CombineMode, Combiner, discover_inputs};
use protprep::services::{FormatConverter, NativeToolkit, ObabelConverter, PdbqtConverter};

use crate::commands::run_with_spinner;

/// Merges prepared receptors with docked ligand poses into complex files.
#[derive(Debug, Args)]
pub struct CombineArgs {
    /// Directory holding `rec_<id>_clean.pdbqt` and ligand `.pdbqt` poses.
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
    /// Receptor files, in addition to any found in `--dir`.
    #[arg(long = "receptor", value_name = "FILE")]
    pub receptors: Vec<PathBuf>,
    /// Ligand files, in addition to any found in `--dir`.
    #[arg(long = "ligand", value_name = "FILE")]
    pub ligands: Vec<PathBuf>,
    /// Write one complex with every ligand instead of one per ligand.
    #[arg(long)]
    pub single: bool,
    /// Output file prefix.
    #[arg(long, value_name = "NAME")]
    pub prefix: Option<String>,
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,
    /// Convert PDBQT inputs with this Open Babel executable instead of the built-in reader.
    #[arg(long, value_name = "PROGRAM")]
    pub obabel: Option<PathBuf>,
}

pub fn run(args: &CombineArgs) -> Result<()> {
    let mut receptors = Vec::new();
    let mut ligands = Vec::new();
    if let Some(dir) = &args.dir {
        let found = discover_inputs(dir)
            .with_context(|| format!("Failed to scan {}", dir.display()))?;
        if let Some(id) = &found.pdb_id {
            tracing::info!(pdb_id = %id, "found docking results");
        }
        receptors.extend(found.receptors);
        ligands.extend(found.ligands);
    }
    receptors.extend(args.receptors.iter().cloned());
    ligands.extend(args.ligands.iter().cloned());

    if ligands.is_empty() {
        bail!("No ligand files given. Use --ligand or point --dir at docking results.");
    }

    let combiner = Combiner::new(CombineConfig {
        mode: if args.single {
            CombineMode::Single
        } else {
            CombineMode::PerLigand
        },
        prefix: args.prefix.clone(),
        out_dir: args.out_dir.clone(),
    });
    let converter: Box<dyn FormatConverter> = match &args.obabel {
        Some(program) => Box::new(ObabelConverter::new(program)),
        None => Box::new(PdbqtConverter),
    };
    let mut toolkit = NativeToolkit::new();

    let outputs = run_with_spinner("Combining structures", || {
        combiner
            .combine(&mut toolkit, converter.as_ref(), &receptors, &ligands)
            .context("Failed to combine structures")
    })?;

    for output in &outputs {
        println!(
            "{}{}",
            output.path.display(),
            if output.metadata_injected {
                " (with pose metadata)"
            } else {
                ""
            }
        );
    }
    Ok(())
}
