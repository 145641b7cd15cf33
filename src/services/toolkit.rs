use super::{Error, run_checked};
use crate::io::{self, ResidueContext};
use crate::model::fragment::Fragment;
use crate::model::grid::Grid;
use crate::model::record::Record;
use crate::ops::merge_fragments;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Hydrogen-to-heavy-atom distance (Å) below which the two are considered bonded.
const H_BOND_LENGTH: f64 = 1.25;

/// Opaque reference to an object held by a [`StructureToolkit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(usize);

/// Atom selections understood by [`StructureToolkit::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Water residues under any common alias.
    Solvent,
    /// Every hydrogen atom.
    Hydrogens,
    /// Hydrogens not bonded to a nitrogen or oxygen.
    NonpolarHydrogens,
    /// Coordinate records on the given chain.
    Chain(String),
    /// Coordinate records with one of the given residue names.
    ResidueNames(Vec<String>),
}

/// Object-level structure handling: named objects can be loaded, merged, edited and saved.
pub trait StructureToolkit {
    /// Loads `path` as a new object called `name`.
    fn load(&mut self, path: &Path, name: &str) -> Result<ObjectHandle, Error>;

    fn save(&self, handle: ObjectHandle, path: &Path) -> Result<(), Error>;

    /// Creates a new object `name` holding the atoms of `handles`, in order.
    fn merge(&mut self, handles: &[ObjectHandle], name: &str) -> Result<ObjectHandle, Error>;

    fn add_hydrogens(&mut self, handle: ObjectHandle) -> Result<(), Error>;

    /// Deletes the selected atoms and returns how many were removed.
    fn remove(&mut self, handle: ObjectHandle, selector: &Selector) -> Result<usize, Error>;

    /// Names of all loaded objects in creation order.
    fn object_names(&self) -> Vec<String>;
}

/// In-process toolkit backed by [`Fragment`]s.
///
/// Hydrogen addition is delegated to Open Babel when a program path is configured.
#[derive(Debug, Clone)]
pub struct NativeToolkit {
    objects: Vec<(String, Fragment)>,
    context: ResidueContext,
    hydrogen_program: Option<PathBuf>,
}

impl Default for NativeToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeToolkit {
    /// Creates an empty toolkit that calls `obabel` from `PATH` for hydrogens.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            context: ResidueContext::new_default(),
            hydrogen_program: Some(PathBuf::from("obabel")),
        }
    }

    pub fn with_hydrogen_program(mut self, program: Option<PathBuf>) -> Self {
        self.hydrogen_program = program;
        self
    }

    pub fn with_context(mut self, context: ResidueContext) -> Self {
        self.context = context;
        self
    }

    /// Adds an already parsed fragment as object `name`.
    pub fn insert(&mut self, name: &str, fragment: Fragment) -> Result<ObjectHandle, Error> {
        if self.objects.iter().any(|(n, _)| n == name) {
            return Err(Error::ObjectExists {
                name: name.to_string(),
            });
        }
        self.objects.push((name.to_string(), fragment.with_name(name)));
        Ok(ObjectHandle(self.objects.len() - 1))
    }

    pub fn fragment(&self, handle: ObjectHandle) -> Result<&Fragment, Error> {
        self.objects
            .get(handle.0)
            .map(|(_, f)| f)
            .ok_or_else(|| Error::unknown_object(format!("#{}", handle.0)))
    }

    /// Replaces the atoms of an existing object, keeping its name.
    pub fn replace(&mut self, handle: ObjectHandle, fragment: Fragment) -> Result<(), Error> {
        let (name, target) = self
            .objects
            .get_mut(handle.0)
            .ok_or_else(|| Error::unknown_object(format!("#{}", handle.0)))?;
        *target = fragment.with_name(name.clone());
        Ok(())
    }

    pub fn handle(&self, name: &str) -> Option<ObjectHandle> {
        self.objects
            .iter()
            .position(|(n, _)| n == name)
            .map(ObjectHandle)
    }

    fn selects(&self, selector: &Selector, polar: &Grid, record: &Record) -> bool {
        if !record.is_coordinate() {
            return false;
        }
        match selector {
            Selector::Solvent => self.context.is_water(record),
            Selector::Hydrogens => is_hydrogen(record),
            Selector::NonpolarHydrogens => {
                is_hydrogen(record)
                    && !record
                        .pos()
                        .is_some_and(|p| polar.any_within(&p, H_BOND_LENGTH))
            }
            Selector::Chain(chain) => record.in_chain(chain),
            Selector::ResidueNames(names) => names.iter().any(|n| record.has_residue_name(n)),
        }
    }
}

fn is_hydrogen(record: &Record) -> bool {
    matches!(record.element_symbol(), Some("H" | "D"))
}

fn is_polar_heavy_atom(record: &Record) -> bool {
    matches!(record.element_symbol(), Some("N" | "O"))
}

impl StructureToolkit for NativeToolkit {
    fn load(&mut self, path: &Path, name: &str) -> Result<ObjectHandle, Error> {
        let fragment = io::load_fragment(path)?;
        debug!(path = %path.display(), name, atoms = fragment.atom_count(), "loaded object");
        self.insert(name, fragment)
    }

    /// Writes the object's atoms and `TER` markers, closed by `END`; header lines are not
    /// part of an object.
    fn save(&self, handle: ObjectHandle, path: &Path) -> Result<(), Error> {
        let mut atoms = self
            .fragment(handle)?
            .filtered(|r| r.is_coordinate() || r.line().trim() == "TER");
        atoms.push(Record::parse("END"));
        io::save_fragment(path, &atoms)?;
        Ok(())
    }

    fn merge(&mut self, handles: &[ObjectHandle], name: &str) -> Result<ObjectHandle, Error> {
        let parts = handles
            .iter()
            .map(|&h| self.fragment(h))
            .collect::<Result<Vec<_>, _>>()?;
        let merged = merge_fragments(parts);
        self.insert(name, merged)
    }

    fn add_hydrogens(&mut self, handle: ObjectHandle) -> Result<(), Error> {
        let program = self.hydrogen_program.clone().ok_or(Error::Unavailable {
            capability: "hydrogen addition",
        })?;

        let scratch = tempfile::tempdir().map_err(|e| Error::file(e, std::env::temp_dir()))?;
        let input = scratch.path().join("input.pdb");
        let output = scratch.path().join("protonated.pdb");
        self.save(handle, &input)?;

        run_checked(
            Command::new(&program)
                .arg("-ipdb")
                .arg(&input)
                .arg("-opdb")
                .arg("-O")
                .arg(&output)
                .arg("-h"),
        )?;

        let protonated = io::load_fragment(&output)?;
        let before = self.fragment(handle)?.atom_count();
        let after = protonated.atom_count();
        self.replace(handle, Fragment::new(protonated.into_records()))?;
        info!(added = after.saturating_sub(before), "added hydrogens");
        Ok(())
    }

    fn remove(&mut self, handle: ObjectHandle, selector: &Selector) -> Result<usize, Error> {
        let fragment = self.fragment(handle)?;
        let polar = Grid::new(
            fragment
                .iter_atoms()
                .filter(|r| is_polar_heavy_atom(r))
                .filter_map(|r| r.pos()),
            H_BOND_LENGTH,
        );
        let mut removed = 0;
        let kept = fragment.filtered(|r| {
            let doomed = self.selects(selector, &polar, r);
            removed += usize::from(doomed);
            !doomed
        });

        self.replace(handle, kept)?;
        debug!(?selector, removed, "removed atoms");
        Ok(removed)
    }

    fn object_names(&self) -> Vec<String> {
        self.objects.iter().map(|(n, _)| n.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROTONATED: &str = "\
ATOM      1  N   ALA A   1       0.000   0.000   0.000  1.00 20.00           N
ATOM      2  H   ALA A   1       1.010   0.000   0.000  1.00 20.00           H
ATOM      3  CA  ALA A   1       0.000   1.500   0.000  1.00 20.00           C
ATOM      4  HA  ALA A   1       0.000   2.590   0.000  1.00 20.00           H
HETATM    5  O   HOH A 101       5.000   5.000   5.000  1.00 20.00           O
HETATM    6  H1  HOH A 101       5.960   5.000   5.000  1.00 20.00           H
ATOM      7  N   GLY B   2       9.000   0.000   0.000  1.00 20.00           N
END";

    fn toolkit_with(text: &str) -> (NativeToolkit, ObjectHandle) {
        let mut toolkit = NativeToolkit::new().with_hydrogen_program(None);
        let handle = toolkit.insert("structure", Fragment::from_text(text)).unwrap();
        (toolkit, handle)
    }

    fn serials(toolkit: &NativeToolkit, handle: ObjectHandle) -> Vec<i32> {
        toolkit
            .fragment(handle)
            .unwrap()
            .iter_atoms()
            .filter_map(|r| r.serial())
            .collect()
    }

    #[test]
    fn removes_solvent() {
        let (mut toolkit, handle) = toolkit_with(PROTONATED);
        assert_eq!(toolkit.remove(handle, &Selector::Solvent).unwrap(), 2);
        assert_eq!(serials(&toolkit, handle), vec![1, 2, 3, 4, 7]);
        assert_eq!(toolkit.fragment(handle).unwrap().name(), Some("structure"));
    }

    #[test]
    fn nonpolar_hydrogens_keep_polar_ones() {
        let (mut toolkit, handle) = toolkit_with(PROTONATED);
        toolkit.remove(handle, &Selector::Solvent).unwrap();
        let removed = toolkit.remove(handle, &Selector::NonpolarHydrogens).unwrap();

        assert_eq!(removed, 1);
        assert_eq!(serials(&toolkit, handle), vec![1, 2, 3, 7]);
    }

    #[test]
    fn chain_and_residue_selectors() {
        let (mut toolkit, handle) = toolkit_with(PROTONATED);

        assert_eq!(
            toolkit
                .remove(handle, &Selector::Chain("B".to_string()))
                .unwrap(),
            1
        );
        assert_eq!(
            toolkit
                .remove(handle, &Selector::ResidueNames(vec!["ALA".to_string()]))
                .unwrap(),
            4
        );
        assert_eq!(serials(&toolkit, handle), vec![5, 6]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let (mut toolkit, _) = toolkit_with(PROTONATED);
        let err = toolkit.insert("structure", Fragment::default()).unwrap_err();
        assert!(matches!(err, Error::ObjectExists { .. }));
    }

    #[test]
    fn merge_creates_named_object() {
        let (mut toolkit, receptor) = toolkit_with(PROTONATED);
        let ligand = toolkit
            .insert(
                "ligand_1",
                Fragment::from_text(
                    "HETATM    1  C1  UNL     1       1.000   2.000   3.000  1.00  0.00           C",
                ),
            )
            .unwrap();

        let complex = toolkit.merge(&[receptor, ligand], "complex_1").unwrap();

        assert_eq!(
            toolkit.object_names(),
            vec!["structure", "ligand_1", "complex_1"]
        );
        assert_eq!(toolkit.fragment(complex).unwrap().atom_count(), 8);
        assert_eq!(toolkit.handle("complex_1"), Some(complex));
    }

    #[test]
    fn hydrogens_without_program_are_unavailable() {
        let (mut toolkit, handle) = toolkit_with(PROTONATED);
        assert!(matches!(
            toolkit.add_hydrogens(handle),
            Err(Error::Unavailable { .. })
        ));
    }

    #[test]
    fn save_drops_header_lines() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdb");
        let output = dir.path().join("out.pdb");
        std::fs::write(&input, format!("HEADER    TEST\n{}\n", PROTONATED)).unwrap();

        let mut toolkit = NativeToolkit::new();
        let handle = toolkit.load(&input, "receptor").unwrap();
        toolkit.remove(handle, &Selector::Hydrogens).unwrap();
        toolkit.save(handle, &output).unwrap();

        let saved = std::fs::read_to_string(&output).unwrap();
        assert_eq!(saved.lines().count(), 5);
        assert!(saved.starts_with("ATOM      1"));
        assert!(saved.ends_with("END\n"));
    }

    #[test]
    fn unknown_handle_is_reported() {
        let toolkit = NativeToolkit::new();
        assert!(matches!(
            toolkit.fragment(ObjectHandle(3)),
            Err(Error::UnknownObject { .. })
        ));
    }
}
