//! Chain and residue-name filters that decide which records of a raw structure survive
//! preparation.
//!
//! Coordinate records are kept per chain, heteroatoms additionally need an operator-approved
//! residue name, and every non-coordinate line passes through untouched at its original
//! position. A narrower variant isolates one ligand instance for separate processing.

use crate::io::{self, ResidueContext};
use crate::model::fragment::Fragment;
use crate::model::record::Record;
use crate::model::types::RecordKind;
use crate::ops::error::Error;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Residue names an operator chose to keep alongside the protein chain.
///
/// Each category is optional. `None` contributes nothing to the allowed set; it does not
/// mean "allow everything". In configuration files a single string is accepted wherever a
/// list is expected and becomes a one-element list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RetentionSet {
    #[serde(default, deserialize_with = "name_list")]
    pub cofactors: Option<Vec<String>>,
    #[serde(default, deserialize_with = "name_list")]
    pub cosubstrates: Option<Vec<String>>,
    #[serde(default, deserialize_with = "name_list")]
    pub metal_ions: Option<Vec<String>>,
    #[serde(default)]
    pub ligand: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NameList {
    One(String),
    Many(Vec<String>),
}

fn name_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<NameList>::deserialize(deserializer)?.map(|list| match list {
            NameList::One(name) => vec![name],
            NameList::Many(names) => names,
        }),
    )
}

impl RetentionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cofactors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cofactors = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_cosubstrates<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cosubstrates = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_metal_ions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metal_ions = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_ligand(mut self, name: impl Into<String>) -> Self {
        self.ligand = Some(name.into());
        self
    }

    /// Union of every supplied category, trimmed.
    pub fn allowed_names(&self) -> HashSet<&str> {
        [&self.cofactors, &self.cosubstrates, &self.metal_ions]
            .into_iter()
            .flatten()
            .flatten()
            .map(String::as_str)
            .chain(self.ligand.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed_names().is_empty()
    }
}

/// Keeps the records of one chain plus the approved heteroatoms on it.
///
/// # Arguments
///
/// * `fragment` - Parsed source structure; it is not modified.
/// * `chain` - Requested chain identifier, compared after trimming.
/// * `retain` - Residue names allowed for `HETATM` records.
///
/// # Returns
///
/// A new [`Fragment`] in which every `ATOM` record lies on `chain`, every `HETATM` record
/// lies on `chain` and carries an allowed residue name, and all other lines keep their
/// original relative order.
pub fn filter_chain(fragment: &Fragment, chain: &str, retain: &RetentionSet) -> Fragment {
    let allowed = retain.allowed_names();
    fragment.filtered(|record| keep_in_chain(record, chain, &allowed))
}

fn keep_in_chain(record: &Record, chain: &str, allowed: &HashSet<&str>) -> bool {
    match record.kind() {
        RecordKind::Atom => record.in_chain(chain),
        RecordKind::Hetatm => {
            record.in_chain(chain)
                && record
                    .residue_name()
                    .is_some_and(|name| allowed.contains(name))
        }
        RecordKind::Other => true,
    }
}

/// Output location of a cleaned receptor: `rec_<stem>_<chain>_clean<suffix>` beside `input`.
pub fn clean_output_path(input: &Path, chain: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    input.with_file_name(format!("rec_{}_{}_clean{}", stem, chain.trim(), suffix))
}

/// Filters a PDB file on disk and writes the result next to it.
///
/// The source file is never rewritten.
pub fn filter_chain_file(
    input: &Path,
    chain: &str,
    retain: &RetentionSet,
) -> Result<PathBuf, Error> {
    let fragment = io::load_fragment(input)?;
    let filtered = filter_chain(&fragment, chain, retain);
    let output = clean_output_path(input, chain);

    info!(
        input = %input.display(),
        output = %output.display(),
        chain,
        kept = filtered.atom_count(),
        dropped = fragment.atom_count() - filtered.atom_count(),
        "filtered receptor chain"
    );

    io::save_fragment(&output, &filtered)?;
    Ok(output)
}

/// Extracts one ligand residue from a chain, dropping solvent and everything else.
///
/// Only small-molecule records named `ligand` on `chain` are kept, whether written as
/// `ATOM` or `HETATM`; solvent, ions and polymer residues never match. Header lines are
/// discarded and the result is closed with `END`.
///
/// # Errors
///
/// Returns [`Error::LigandNotFound`] when no record matches.
pub fn isolate_ligand(
    fragment: &Fragment,
    chain: &str,
    ligand: &str,
    context: &ResidueContext,
) -> Result<Fragment, Error> {
    let mut isolated = fragment.filtered(|record| {
        record.is_coordinate()
            && context.is_organic(record)
            && record.in_chain(chain)
            && record.has_residue_name(ligand)
    });

    if isolated.is_empty() {
        return Err(Error::ligand_not_found(ligand.trim(), chain.trim()));
    }
    debug!(ligand, chain, atoms = isolated.len(), "isolated ligand");

    isolated.push(Record::parse("END"));
    Ok(isolated)
}

/// Output location of an isolated ligand: `lig_<pdb_id>.pdb` inside `dir`.
pub fn ligand_output_path(dir: &Path, pdb_id: &str) -> PathBuf {
    dir.join(format!("lig_{}.pdb", pdb_id))
}

/// Loads `input`, isolates `ligand` on `chain`, and saves it as `lig_<pdb_id>.pdb` in
/// `out_dir`.
pub fn isolate_ligand_file(
    input: &Path,
    out_dir: &Path,
    pdb_id: &str,
    chain: &str,
    ligand: &str,
    context: &ResidueContext,
) -> Result<PathBuf, Error> {
    let fragment = io::load_fragment(input)?;
    let isolated = isolate_ligand(&fragment, chain, ligand, context)?;
    let output = ligand_output_path(out_dir, pdb_id);

    io::save_fragment(&output, &isolated)?;
    info!(output = %output.display(), ligand, "saved isolated ligand");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALA_N: &str =
        "ATOM      1  N   ALA A   1      10.000  20.000  30.000  1.00 20.00           N";

    const RAW: &str = "\
HEADER    TRANSFERASE
REMARK   2 RESOLUTION.    2.10 ANGSTROMS.
ATOM      1  N   ALA A   1      10.000  20.000  30.000  1.00 20.00           N
ATOM      2  CA  ALA A   1      11.000  20.000  30.000  1.00 20.00           C
ATOM      3  N   GLY B   1       1.000   2.000   3.000  1.00 20.00           N
TER
HETATM    4 FE   HEM A 201       0.000   0.000   0.000  1.00 20.00          FE
HETATM    5  C1  SB4 A 301       4.000   0.000   0.000  1.00 20.00           C
HETATM    6  C2  SB4 A 301       5.000   0.000   0.000  1.00 20.00           C
HETATM    7  C1  SB4 B 301       4.000   9.000   0.000  1.00 20.00           C
HETATM    8 ZN    ZN A 401       7.000   7.000   7.000  1.00 20.00          ZN
HETATM    9  O   HOH A 501       9.000   9.000   9.000  1.00 20.00           O
HETATM   10  C1  SO4
END";

    fn raw() -> Fragment {
        Fragment::from_text(RAW)
    }

    #[test]
    fn atom_record_kept_only_for_requested_chain() {
        let fragment = Fragment::from_text(ALA_N);
        let retain = RetentionSet::new();

        assert_eq!(filter_chain(&fragment, "A", &retain).atom_count(), 1);
        assert_eq!(filter_chain(&fragment, "B", &retain).atom_count(), 0);
    }

    #[test]
    fn hetatm_needs_an_allowed_name() {
        let hem = Fragment::from_text(
            "HETATM    4 FE   HEM A 201       0.000   0.000   0.000  1.00 20.00          FE",
        );

        let with_cofactor = RetentionSet::new().with_cofactors(["HEM"]);
        assert_eq!(filter_chain(&hem, "A", &with_cofactor).atom_count(), 1);

        let nothing = RetentionSet::new();
        assert_eq!(filter_chain(&hem, "A", &nothing).atom_count(), 0);
    }

    #[test]
    fn retained_records_satisfy_chain_and_name_rules() {
        let retain = RetentionSet::new()
            .with_cofactors(["HEM"])
            .with_metal_ions(["ZN"])
            .with_ligand("SB4");
        let filtered = filter_chain(&raw(), "A", &retain);
        let allowed = retain.allowed_names();

        for record in filtered.iter_atoms() {
            assert_eq!(record.chain_id(), Some('A'));
            if record.kind() == RecordKind::Hetatm {
                assert!(allowed.contains(record.residue_name().unwrap()));
            }
        }
        let serials: Vec<_> = filtered.iter_atoms().filter_map(|r| r.serial()).collect();
        assert_eq!(serials, vec![1, 2, 4, 5, 6, 8]);
    }

    #[test]
    fn other_lines_survive_in_order() {
        let filtered = filter_chain(&raw(), "B", &RetentionSet::new());
        let others: Vec<_> = filtered
            .iter_records()
            .filter(|r| r.kind() == RecordKind::Other)
            .map(|r| r.line())
            .collect();

        assert_eq!(
            others,
            vec![
                "HEADER    TRANSFERASE",
                "REMARK   2 RESOLUTION.    2.10 ANGSTROMS.",
                "TER",
                "END"
            ]
        );
        let lines: Vec<_> = filtered.iter_records().map(|r| r.line()).collect();
        assert_eq!(lines[2], RAW.lines().nth(4).unwrap());
        assert_eq!(lines[3], "TER");
    }

    #[test]
    fn hetatm_without_chain_column_is_dropped() {
        let retain = RetentionSet::new().with_cofactors(["SO4"]);
        let filtered = filter_chain(&raw(), "A", &retain);

        assert!(filtered.iter_records().all(|r| !r.line().contains("SO4")));
    }

    #[test]
    fn empty_list_filters_the_category_out() {
        let retain = RetentionSet::new().with_cofactors(Vec::<String>::new());
        let filtered = filter_chain(&raw(), "A", &retain);

        assert!(filtered.iter_atoms().all(|r| r.kind() == RecordKind::Atom));
    }

    #[test]
    fn filtering_is_idempotent() {
        let retain = RetentionSet::new().with_cofactors(["HEM"]).with_ligand("SB4");
        let once = filter_chain(&raw(), "A", &retain);
        let twice = filter_chain(&once, "A", &retain);

        assert_eq!(once.to_text(), twice.to_text());
    }

    #[test]
    fn single_string_deserializes_as_list() {
        let retain: RetentionSet = toml::from_str(
            r#"
            cofactors = "HEM"
            metal_ions = ["ZN", "MG"]
            ligand = "SB4"
            "#,
        )
        .unwrap();

        assert_eq!(retain.cofactors, Some(vec!["HEM".to_string()]));
        assert_eq!(retain.metal_ions, Some(vec!["ZN".to_string(), "MG".to_string()]));
        assert_eq!(retain.cosubstrates, None);
        assert!(retain.allowed_names().contains("SB4"));
    }

    #[test]
    fn clean_output_path_follows_naming_convention() {
        assert_eq!(
            clean_output_path(Path::new("/data/3ERK.pdb"), "A"),
            PathBuf::from("/data/rec_3ERK_A_clean.pdb")
        );
        assert_eq!(
            clean_output_path(Path::new("model"), "B"),
            PathBuf::from("rec_model_B_clean")
        );
    }

    #[test]
    fn filter_chain_file_leaves_source_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("3ERK.pdb");
        std::fs::write(&input, format!("{}\n", RAW)).unwrap();

        let output = filter_chain_file(&input, "A", &RetentionSet::new()).unwrap();

        assert_eq!(output, dir.path().join("rec_3ERK_A_clean.pdb"));
        assert_eq!(std::fs::read_to_string(&input).unwrap(), format!("{}\n", RAW));
        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("ALA A"));
        assert!(!written.contains("HETATM"));
    }

    #[test]
    fn isolates_single_ligand_instance() {
        let context = ResidueContext::new_default();
        let ligand = isolate_ligand(&raw(), "A", "SB4", &context).unwrap();

        assert_eq!(ligand.atom_count(), 2);
        assert!(ligand.iter_atoms().all(|r| r.chain_id() == Some('A')));
        assert_eq!(ligand.records().last().unwrap().line(), "END");
    }

    #[test]
    fn isolating_water_or_missing_ligand_fails() {
        let context = ResidueContext::new_default();

        assert!(matches!(
            isolate_ligand(&raw(), "A", "HOH", &context),
            Err(Error::LigandNotFound { .. })
        ));
        assert!(matches!(
            isolate_ligand(&raw(), "C", "SB4", &context),
            Err(Error::LigandNotFound { .. })
        ));
    }

    #[test]
    fn isolates_ligand_written_as_atom_records() {
        let docked = Fragment::from_text(
            "\
ATOM      1  N   ALA A   1      10.000  20.000  30.000  1.00 20.00           N
ATOM      2  C1  UNL A 900       1.000   0.000   0.000  1.00  0.00           C
ATOM      3  O1  UNL A 900       2.000   0.000   0.000  1.00  0.00           O
END",
        );
        let context = ResidueContext::new_default();

        let ligand = isolate_ligand(&docked, "A", "UNL", &context).unwrap();
        assert_eq!(ligand.atom_count(), 2);
        assert!(matches!(
            isolate_ligand(&docked, "A", "ALA", &context),
            Err(Error::LigandNotFound { .. })
        ));
    }

    #[test]
    fn isolate_ligand_file_uses_pdb_id_name() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("3ERK.pdb");
        std::fs::write(&input, RAW).unwrap();

        let output = isolate_ligand_file(
            &input,
            dir.path(),
            "3ERK",
            "A",
            "SB4",
            &ResidueContext::new_default(),
        )
        .unwrap();

        assert_eq!(output, dir.path().join("lig_3ERK.pdb"));
    }
}
