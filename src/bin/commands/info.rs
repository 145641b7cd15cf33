use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use prettytable::{Table, format, row};

use protprep::io::ResidueContext;
use protprep::{Fragment, RecordKind, ResidueClass};

use crate::commands::{load_structure, print_boxed_label, run_with_spinner};

/// Lists chains and hetero groups so chain and retention names can be chosen up front.
#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Structure to inspect (PDB or PDBQT).
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let fragment = load_structure(&args.input)?;
    let context = ResidueContext::new_default();

    let (chains, hetero) = run_with_spinner("Analyzing structure", || {
        Ok((
            collect_chain_reports(&fragment),
            collect_hetero_reports(&fragment, &context),
        ))
    })?;

    print_tables(&chains, &hetero)
}

#[derive(Debug, Default)]
struct ChainReport {
    residues: BTreeSet<(i32, Option<char>)>,
    atoms: usize,
    hetero_atoms: usize,
}

#[derive(Debug)]
struct HeteroReport {
    chain: char,
    name: String,
    class: ResidueClass,
    instances: usize,
}

fn collect_chain_reports(fragment: &Fragment) -> BTreeMap<char, ChainReport> {
    let mut chains: BTreeMap<char, ChainReport> = BTreeMap::new();
    for record in fragment.iter_atoms() {
        let Some(chain) = record.chain_id() else {
            continue;
        };
        let report = chains.entry(chain).or_default();
        match record.kind() {
            RecordKind::Atom => {
                report.atoms += 1;
                if let Some(seq) = record.residue_seq() {
                    report.residues.insert((seq, record.insertion_code()));
                }
            }
            _ => report.hetero_atoms += 1,
        }
    }
    chains
}

fn collect_hetero_reports(fragment: &Fragment, context: &ResidueContext) -> Vec<HeteroReport> {
    fragment
        .hetero_inventory()
        .into_iter()
        .flat_map(|(chain, names)| {
            names.into_iter().map(move |(name, instances)| HeteroReport {
                chain,
                class: context.lookup(&name).unwrap_or(ResidueClass::Organic),
                name,
                instances,
            })
        })
        .collect()
}

fn class_label(class: ResidueClass) -> &'static str {
    match class {
        ResidueClass::Polymer => "Modified residue",
        ResidueClass::Water => "Water",
        ResidueClass::Ion => "Ion",
        ResidueClass::Organic => "Ligand / cofactor",
    }
}

fn print_tables(chains: &BTreeMap<char, ChainReport>, hetero: &[HeteroReport]) -> Result<()> {
    let mut stdout = io::stdout().lock();

    print_boxed_label(&mut stdout, "Chain Breakdown")?;
    let mut chain_table = Table::new();
    chain_table.set_format(*format::consts::FORMAT_BOX_CHARS);
    chain_table.set_titles(row!["Chain", "Residues", "Atoms", "Hetero Atoms"]);
    for (id, report) in chains {
        chain_table.add_row(row![
            id,
            report.residues.len(),
            report.atoms,
            report.hetero_atoms
        ]);
    }
    chain_table
        .print(&mut stdout)
        .context("Failed to render chain summary")?;
    writeln!(&mut stdout)?;

    print_boxed_label(&mut stdout, "Hetero Groups")?;
    if hetero.is_empty() {
        writeln!(&mut stdout, "No HETATM records.")?;
        return Ok(());
    }
    let mut hetero_table = Table::new();
    hetero_table.set_format(*format::consts::FORMAT_BOX_CHARS);
    hetero_table.set_titles(row!["Chain", "Residue", "Kind", "Instances"]);
    for group in hetero {
        hetero_table.add_row(row![
            group.chain,
            group.name,
            class_label(group.class),
            group.instances
        ]);
    }
    hetero_table
        .print(&mut stdout)
        .context("Failed to render hetero summary")?;

    Ok(())
}
