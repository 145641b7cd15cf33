//! Merging prepared receptors with docked ligand poses into complex files.
//!
//! Inputs are converted to PDB when needed, loaded into a [`StructureToolkit`] under
//! collision-free object names, merged with fresh atom serials, saved, and finally decorated
//! with the pose metadata of the ligands they contain.

use crate::io;
use crate::model::fragment::Fragment;
use crate::model::record::Record;
use crate::ops::error::Error;
use crate::ops::metadata::{
    PoseMetadata, extract_metadata_file, merge_metadata, reinject_metadata,
};
use crate::services::{FormatConverter, ObjectHandle, StructureFormat, StructureToolkit};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

type ResidueKey = (Option<char>, i32, Option<char>);

fn residue_key(record: &Record) -> Option<ResidueKey> {
    Some((
        record.chain_id(),
        record.residue_seq()?,
        record.insertion_code(),
    ))
}

/// Concatenates the coordinate records of `fragments` into one structure.
///
/// Atom serials restart at 1 and run across all inputs. A fragment whose residues would clash
/// with an earlier fragment's (same chain, number and insertion code) is shifted to follow the
/// highest residue number used so far. Each input is closed by `TER` and the result by `END`;
/// header lines of the inputs are not carried over.
pub fn merge_fragments<'a, I>(fragments: I) -> Fragment
where
    I: IntoIterator<Item = &'a Fragment>,
{
    let mut merged = Fragment::default();
    let mut used: HashSet<ResidueKey> = HashSet::new();
    let mut max_seq = 0;
    let mut serial = 0;

    for fragment in fragments {
        let atoms: Vec<&Record> = fragment.iter_atoms().collect();
        if atoms.is_empty() {
            continue;
        }

        let keys: HashSet<ResidueKey> = atoms.iter().filter_map(|r| residue_key(r)).collect();
        let offset = if keys.iter().any(|k| used.contains(k)) {
            let lowest = keys.iter().map(|k| k.1).min().unwrap_or(0);
            max_seq - lowest + 1
        } else {
            0
        };

        for record in atoms {
            serial += 1;
            let shifted = (offset != 0)
                .then(|| record.residue_seq().map(|s| s + offset))
                .flatten();
            let renumbered = record.renumbered(serial, shifted);
            if let Some(key) = residue_key(&renumbered) {
                max_seq = max_seq.max(key.1);
                used.insert(key);
            }
            merged.push(renumbered);
        }
        merged.push(Record::parse("TER"));
    }

    merged.push(Record::parse("END"));
    merged
}

/// How ligands are distributed over output files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CombineMode {
    /// One complex per ligand, each containing every receptor.
    #[default]
    PerLigand,
    /// A single complex with every receptor and every ligand.
    Single,
}

/// Output naming and placement.
#[derive(Debug, Clone, Default)]
pub struct CombineConfig {
    pub mode: CombineMode,
    pub prefix: Option<String>,
    /// Directory receiving the complexes; the current directory when empty.
    pub out_dir: PathBuf,
}

/// One written complex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineOutput {
    pub path: PathBuf,
    /// Toolkit object holding the merged structure.
    pub object: String,
    /// Whether pose metadata was written to the top of the file.
    pub metadata_injected: bool,
}

/// File name of a per-ligand complex: `<prefix>_<base>.pdb` or `complex_<base>.pdb`.
pub fn per_ligand_file_name(prefix: Option<&str>, base: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}_{}.pdb", prefix, base),
        None => format!("complex_{}.pdb", base),
    }
}

/// File name of a single combined complex.
///
/// Without a prefix it lists up to two ligand names and counts the rest:
/// `complex_a.pdb`, `complex_a_and_b.pdb`, `complex_a_and_b_plus_3_more.pdb`. A complex with
/// no ligand is `complex.pdb`.
pub fn combined_file_name(prefix: Option<&str>, bases: &[String]) -> String {
    if let Some(prefix) = prefix {
        return format!("{}.pdb", prefix);
    }
    match bases {
        [] => return "complex.pdb".to_string(),
        [only] => return format!("complex_{}.pdb", only),
        _ => {}
    }

    let mut name = format!(
        "complex_{}",
        bases.iter().take(2).cloned().collect::<Vec<_>>().join("_and_")
    );
    if bases.len() > 2 {
        name.push_str(&format!("_plus_{}_more", bases.len() - 2));
    }
    name.push_str(".pdb");
    name
}

/// Picks the first free object name in the sequence `stem` / `stem_2` (or `stem_1`, `stem_2`
/// when `bare_first` is false) starting at `index`.
pub(crate) fn claim_name(
    taken: &mut HashSet<String>,
    stem: &str,
    mut index: usize,
    bare_first: bool,
) -> String {
    loop {
        let candidate = if bare_first && index == 1 {
            stem.to_string()
        } else {
            format!("{}_{}", stem, index)
        };
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        index += 1;
    }
}

fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

struct LoadedLigand {
    source: PathBuf,
    base: String,
    handle: ObjectHandle,
}

/// Receptor/ligand merger.
#[derive(Debug, Clone, Default)]
pub struct Combiner {
    config: CombineConfig,
}

impl Combiner {
    pub fn new(config: CombineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CombineConfig {
        &self.config
    }

    /// Converts and loads one input, logging and skipping it on failure.
    fn load_input<T, C>(
        &self,
        toolkit: &mut T,
        converter: &C,
        path: &Path,
        name: &str,
    ) -> Option<ObjectHandle>
    where
        T: StructureToolkit + ?Sized,
        C: FormatConverter + ?Sized,
    {
        let mut attempt = || -> Result<ObjectHandle, Error> {
            let pdb = match StructureFormat::from_path(path) {
                Some(StructureFormat::Pdbqt) => {
                    converter.convert(path, StructureFormat::Pdbqt, StructureFormat::Pdb)?
                }
                _ => path.to_path_buf(),
            };
            Ok(toolkit.load(&pdb, name)?)
        };

        match attempt() {
            Ok(handle) => {
                info!(path = %path.display(), object = name, "loaded input");
                Some(handle)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping input that failed to load");
                None
            }
        }
    }

    /// Merges `receptors` with `ligands` according to the configured mode.
    ///
    /// Inputs that fail to convert or load are skipped with a warning. When only receptors
    /// load, per-ligand mode writes nothing and single mode writes the receptors alone.
    /// Metadata reinjection failures are logged and reported through
    /// [`CombineOutput::metadata_injected`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NothingToCombine`] when neither a receptor nor a ligand could be
    /// loaded, and propagates merge and save failures.
    pub fn combine<T, C>(
        &self,
        toolkit: &mut T,
        converter: &C,
        receptors: &[PathBuf],
        ligands: &[PathBuf],
    ) -> Result<Vec<CombineOutput>, Error>
    where
        T: StructureToolkit + ?Sized,
        C: FormatConverter + ?Sized,
    {
        let mut taken: HashSet<String> = toolkit.object_names().into_iter().collect();

        let mut receptor_handles = Vec::new();
        for (i, path) in receptors.iter().enumerate() {
            let name = claim_name(&mut taken, "receptor", i + 1, true);
            if let Some(handle) = self.load_input(toolkit, converter, path, &name) {
                receptor_handles.push(handle);
            }
        }

        let mut loaded = Vec::new();
        for (i, path) in ligands.iter().enumerate() {
            let name = claim_name(&mut taken, "ligand", i + 1, false);
            if let Some(handle) = self.load_input(toolkit, converter, path, &name) {
                loaded.push(LoadedLigand {
                    source: path.clone(),
                    base: base_name(path),
                    handle,
                });
            }
        }

        if receptor_handles.is_empty() && loaded.is_empty() {
            return Err(Error::NothingToCombine);
        }
        if loaded.is_empty() {
            warn!(receptors = receptor_handles.len(), "no ligand could be loaded");
        }

        let prefix = self.config.prefix.as_deref();
        let mut groups: Vec<(String, Vec<&LoadedLigand>)> = Vec::new();
        match self.config.mode {
            CombineMode::PerLigand => {
                for ligand in &loaded {
                    groups.push((per_ligand_file_name(prefix, &ligand.base), vec![ligand]));
                }
            }
            CombineMode::Single => {
                let bases: Vec<String> = loaded.iter().map(|l| l.base.clone()).collect();
                groups.push((combined_file_name(prefix, &bases), loaded.iter().collect()));
            }
        }

        let mut outputs = Vec::with_capacity(groups.len());
        for (i, (file_name, members)) in groups.into_iter().enumerate() {
            let object = claim_name(&mut taken, "complex", i + 1, false);
            let handles: Vec<ObjectHandle> = receptor_handles
                .iter()
                .copied()
                .chain(members.iter().map(|l| l.handle))
                .collect();

            let path = self.config.out_dir.join(&file_name);
            let merged = toolkit.merge(&handles, &object)?;
            toolkit.save(merged, &path)?;

            let blocks: Vec<PoseMetadata> = members
                .iter()
                .map(|l| {
                    extract_metadata_file(&l.source).unwrap_or_else(|err| {
                        warn!(path = %l.source.display(), error = %err, "could not read pose metadata");
                        PoseMetadata::default()
                    })
                })
                .collect();
            let metadata = merge_metadata(&blocks);
            let metadata_injected = reinject_metadata(&path, &metadata);

            info!(output = %path.display(), object = %object, ligands = members.len(), "saved complex");
            outputs.push(CombineOutput {
                path,
                object,
                metadata_injected,
            });
        }

        Ok(outputs)
    }
}

/// Docking results found in one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockingInputs {
    /// Identifier recovered from the first receptor name.
    pub pdb_id: Option<String>,
    /// `rec_<id>_clean.pdbqt` files.
    pub receptors: Vec<PathBuf>,
    /// Every other `.pdbqt` file.
    pub ligands: Vec<PathBuf>,
}

fn receptor_id(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix("rec_")?
        .strip_suffix("_clean.pdbqt")
        .filter(|id| !id.is_empty())
}

/// Sorts the `.pdbqt` files of `dir` into receptors and ligand poses, by file name.
pub fn discover_inputs(dir: &Path) -> Result<DockingInputs, Error> {
    let entries = fs::read_dir(dir).map_err(|e| io::Error::from_io(e, Some(dir.to_path_buf())))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io::Error::from_io(e, Some(dir.to_path_buf())))?;
        let path = entry.path();
        if path.is_file() && StructureFormat::from_path(&path) == Some(StructureFormat::Pdbqt) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut inputs = DockingInputs::default();
    for path in paths {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match receptor_id(&file_name) {
            Some(id) => {
                if inputs.pdb_id.is_none() {
                    inputs.pdb_id = Some(id.to_string());
                }
                inputs.receptors.push(path);
            }
            None => inputs.ligands.push(path),
        }
    }
    Ok(inputs)
}
