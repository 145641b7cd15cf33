use std::io::{self as stdio, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;

use protprep::Fragment;
use protprep::io::{load_fragment, load_pdbqt_fragment};
use protprep::services::StructureFormat;

pub mod clean;
pub mod combine;
pub mod hydro;
pub mod info;
pub mod ligand;
pub mod logging;
pub mod metadata;
pub mod prepare;
pub mod solvate;

/// Loads a PDB or PDBQT file, choosing the reader from the extension.
///
/// Unknown extensions are read as PDB.
pub fn load_structure(path: &Path) -> Result<Fragment> {
    let fragment = match StructureFormat::from_path(path) {
        Some(StructureFormat::Pdbqt) => load_pdbqt_fragment(path),
        _ => load_fragment(path),
    };
    fragment.with_context(|| format!("Failed to read structure from {}", path.display()))
}

/// Wraps long-running operations with a spinner rendered to stderr.
///
/// Without a terminal on stderr the work runs silently so log output stays clean.
pub fn run_with_spinner<T, F>(message: &str, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    if !stdio::stderr().is_terminal() {
        return work();
    }

    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());

    let result = work();

    match &result {
        Ok(_) => spinner.finish_with_message(format!("{} ✓", message)),
        Err(_) => spinner.abandon_with_message(format!("{} ✗", message)),
    }

    result
}

/// Normalizes a repeated residue-name flag; an absent flag stays `None`.
pub fn build_name_list(values: &[String]) -> Option<Vec<String>> {
    if values.is_empty() {
        return None;
    }
    Some(
        values
            .iter()
            .map(|v| v.trim().to_ascii_uppercase())
            .filter(|v| !v.is_empty())
            .collect(),
    )
}

pub fn print_boxed_label<W: Write>(writer: &mut W, title: &str) -> stdio::Result<()> {
    let inner = format!(" {title} ");
    let width = inner.chars().count();
    writeln!(writer, "╭{}╮", "─".repeat(width))?;
    writeln!(writer, "│{}│", inner)?;
    writeln!(writer, "╰{}╯", "─".repeat(width))?;
    Ok(())
}
