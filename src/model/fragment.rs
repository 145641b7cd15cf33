//! Ordered record collections representing one structure file.
//!
//! A [`Fragment`] owns its records exclusively and optionally remembers where it came from and
//! which logical object name it carries during merges.

use super::record::Record;
use super::types::{Point, RecordKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One structure file worth of records in original order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    records: Vec<Record>,
    path: Option<PathBuf>,
    name: Option<String>,
}

impl Fragment {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            path: None,
            name: None,
        }
    }

    /// Parses every line of `text` into a fragment.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines().map(Record::parse).collect())
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn iter_records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Iterates over `ATOM` and `HETATM` records only.
    pub fn iter_atoms(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.is_coordinate())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn atom_count(&self) -> usize {
        self.iter_atoms().count()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = Record>) {
        self.records.extend(records);
    }

    /// Returns a new fragment holding the records accepted by `predicate`, in order.
    ///
    /// Path and name are not carried over; the result describes a different file.
    pub fn filtered<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&Record) -> bool,
    {
        Self::new(
            self.records
                .iter()
                .filter(|r| predicate(*r))
                .cloned()
                .collect(),
        )
    }

    /// Positions of every coordinate record whose x, y and z columns parsed.
    pub fn coordinates(&self) -> Vec<Point> {
        self.iter_atoms().filter_map(|r| r.pos()).collect()
    }

    /// Highest atom serial and residue number among coordinate records.
    ///
    /// A record contributes only when both its serial and residue number parse; unnumbered
    /// fragments report `(0, 0)`.
    pub fn numbering_high_water(&self) -> (i32, i32) {
        self.iter_atoms()
            .filter_map(|r| Some((r.serial()?, r.residue_seq()?)))
            .fold((0, 0), |(serial, seq), (s, r)| (serial.max(s), seq.max(r)))
    }

    /// Distinct chain identifiers in order of first appearance.
    pub fn chain_ids(&self) -> Vec<char> {
        let mut seen = Vec::new();
        for c in self.iter_atoms().filter_map(|r| r.chain_id()) {
            if !seen.contains(&c) {
                seen.push(c);
            }
        }
        seen
    }

    /// Hetero residue names per chain with the number of distinct residue instances.
    pub fn hetero_inventory(&self) -> BTreeMap<char, BTreeMap<String, usize>> {
        let mut instances: BTreeMap<char, BTreeMap<String, Vec<(i32, Option<char>)>>> =
            BTreeMap::new();

        for record in self
            .iter_atoms()
            .filter(|r| r.kind() == RecordKind::Hetatm)
        {
            let (Some(chain), Some(name)) = (record.chain_id(), record.residue_name()) else {
                continue;
            };
            let key = (record.residue_seq().unwrap_or_default(), record.insertion_code());
            let seen = instances
                .entry(chain)
                .or_default()
                .entry(name.to_string())
                .or_default();
            if !seen.contains(&key) {
                seen.push(key);
            }
        }

        instances
            .into_iter()
            .map(|(chain, names)| {
                (
                    chain,
                    names.into_iter().map(|(n, keys)| (n, keys.len())).collect(),
                )
            })
            .collect()
    }

    /// Renders the fragment as newline-terminated text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(record.line());
            out.push('\n');
        }
        out
    }
}

impl FromIterator<Record> for Fragment {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
HEADER    TRANSFERASE
ATOM      1  N   ALA A   1      10.000  20.000  30.000  1.00 20.00           N
ATOM      2  CA  ALA A   1      11.000  20.000  30.000  1.00 20.00           C
ATOM      3  N   GLY B   7       1.000   2.000   3.000  1.00 20.00           N
HETATM    4 FE   HEM A 201       0.000   0.000   0.000  1.00 20.00          FE
HETATM    5  C1  HEM A 201       1.000   0.000   0.000  1.00 20.00           C
HETATM    6 ZN    ZN B 301       5.000   5.000   5.000  1.00 20.00          ZN
TER
END";

    #[test]
    fn from_text_preserves_every_line() {
        let fragment = Fragment::from_text(SAMPLE);

        assert_eq!(fragment.len(), 9);
        assert_eq!(fragment.atom_count(), 6);
        assert_eq!(fragment.to_text(), format!("{}\n", SAMPLE));
    }

    #[test]
    fn coordinates_skip_non_atom_records() {
        let fragment = Fragment::from_text(SAMPLE);
        let coords = fragment.coordinates();

        assert_eq!(coords.len(), 6);
        assert_eq!(coords[0], Point::new(10.0, 20.0, 30.0));
    }

    #[test]
    fn numbering_high_water_tracks_serial_and_residue() {
        let fragment = Fragment::from_text(SAMPLE);
        assert_eq!(fragment.numbering_high_water(), (6, 301));
    }

    #[test]
    fn numbering_high_water_ignores_partially_numbered_records() {
        let fragment = Fragment::from_text("ATOM     99  N   ALA");
        assert_eq!(fragment.numbering_high_water(), (0, 0));
    }

    #[test]
    fn chain_ids_are_in_first_seen_order() {
        let fragment = Fragment::from_text(SAMPLE);
        assert_eq!(fragment.chain_ids(), vec!['A', 'B']);
    }

    #[test]
    fn hetero_inventory_counts_residue_instances() {
        let fragment = Fragment::from_text(SAMPLE);
        let inventory = fragment.hetero_inventory();

        assert_eq!(inventory[&'A']["HEM"], 1);
        assert_eq!(inventory[&'B']["ZN"], 1);
        assert!(!inventory[&'A'].contains_key("ZN"));
    }

    #[test]
    fn filtered_drops_path_and_name() {
        let fragment = Fragment::from_text(SAMPLE)
            .with_path("/tmp/x.pdb")
            .with_name("receptor");
        let filtered = fragment.filtered(|r| r.kind() == RecordKind::Other);

        assert_eq!(filtered.len(), 3);
        assert!(filtered.path().is_none());
        assert!(filtered.name().is_none());
    }
}
