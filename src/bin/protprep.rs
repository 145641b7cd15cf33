use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

mod commands;

use commands::logging::{run_log_path, setup_logging};
use commands::{clean, combine, hydro, info, ligand, metadata, prepare, solvate};

#[derive(Parser, Debug)]
#[command(
    name = "protprep",
    about = "Prepares protein structures for docking and molecular dynamics: chain filtering, ligand isolation, hydrogens, waters, and receptor-ligand complexes.",
    version,
    author,
    arg_required_else_help = true
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Silence all log output.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Also write logs to this file.
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List chains and hetero groups of a structure.
    Info(info::InfoArgs),
    /// Keep one chain plus the selected cofactors, co-substrates, metal ions and ligand.
    Clean(clean::CleanArgs),
    /// Extract one ligand residue into its own file.
    Ligand(ligand::LigandArgs),
    /// Add polar hydrogens in place, preserving pose metadata.
    Hydro(hydro::HydroArgs),
    /// Surround the structure with a shell of waters.
    Solvate(solvate::SolvateArgs),
    /// Merge receptors with docked ligands into complexes.
    Combine(combine::CombineArgs),
    /// Show or copy the scoring remarks of a docked pose.
    Metadata(metadata::MetadataArgs),
    /// Run a batch preparation plan.
    Prepare(prepare::PrepareArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Plans choose the log directory, so they are read before logging starts.
    let plan = match &cli.command {
        Command::Prepare(args) => Some(prepare::load_plan(args)?),
        _ => None,
    };
    let log_file = cli
        .log_file
        .clone()
        .or_else(|| plan.as_ref().map(|p| run_log_path(&p.log_dir)));
    setup_logging(cli.verbose, cli.quiet, log_file.as_deref())?;

    match &cli.command {
        Command::Info(args) => info::run(args)?,
        Command::Clean(args) => clean::run(args)?,
        Command::Ligand(args) => ligand::run(args)?,
        Command::Hydro(args) => hydro::run(args)?,
        Command::Solvate(args) => solvate::run(args)?,
        Command::Combine(args) => combine::run(args)?,
        Command::Metadata(args) => metadata::run(args)?,
        Command::Prepare(_) => {
            if let Some(plan) = plan {
                prepare::run(plan)?;
            }
        }
    }

    Ok(())
}
