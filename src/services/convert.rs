use super::{Error, run_checked};
use crate::io;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use tracing::info;

/// Structure file formats the preparation workflow moves between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureFormat {
    Pdb,
    Pdbqt,
}

impl StructureFormat {
    /// Infers the format from a file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }

    pub fn extension(&self) -> &'static str {
        match self {
            StructureFormat::Pdb => "pdb",
            StructureFormat::Pdbqt => "pdbqt",
        }
    }
}

impl fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for StructureFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdb" | "ent" => Ok(StructureFormat::Pdb),
            "pdbqt" => Ok(StructureFormat::Pdbqt),
            other => Err(Error::unsupported_format(other, "pdb")),
        }
    }
}

/// Converts a structure file and returns the path of the converted copy.
pub trait FormatConverter {
    fn convert(
        &self,
        input: &Path,
        from: StructureFormat,
        to: StructureFormat,
    ) -> Result<PathBuf, Error>;
}

/// Converted files are written beside the input with the target extension.
fn converted_path(input: &Path, to: StructureFormat) -> PathBuf {
    input.with_extension(to.extension())
}

/// Built-in PDBQT to PDB conversion that keeps the first pose.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdbqtConverter;

impl FormatConverter for PdbqtConverter {
    fn convert(
        &self,
        input: &Path,
        from: StructureFormat,
        to: StructureFormat,
    ) -> Result<PathBuf, Error> {
        match (from, to) {
            (a, b) if a == b => Ok(input.to_path_buf()),
            (StructureFormat::Pdbqt, StructureFormat::Pdb) => {
                let output = converted_path(input, to);
                let fragment = io::load_pdbqt_fragment(input)?;
                io::save_fragment(&output, &fragment)?;
                info!(input = %input.display(), output = %output.display(), "converted to PDB");
                Ok(output)
            }
            (from, to) => Err(Error::unsupported_format(from, to)),
        }
    }
}

/// Conversion through the Open Babel command-line tool.
#[derive(Debug, Clone)]
pub struct ObabelConverter {
    program: PathBuf,
}

impl Default for ObabelConverter {
    fn default() -> Self {
        Self::new("obabel")
    }
}

impl ObabelConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl FormatConverter for ObabelConverter {
    fn convert(
        &self,
        input: &Path,
        from: StructureFormat,
        to: StructureFormat,
    ) -> Result<PathBuf, Error> {
        if from == to {
            return Ok(input.to_path_buf());
        }
        let output = converted_path(input, to);
        run_checked(
            Command::new(&self.program)
                .arg(format!("-i{}", from))
                .arg(input)
                .arg(format!("-o{}", to))
                .arg("-O")
                .arg(&output),
        )?;
        info!(input = %input.display(), output = %output.display(), "converted with obabel");
        Ok(output)
    }
}
