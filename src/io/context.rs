use crate::model::record::Record;
use crate::model::types::{RecordKind, ResidueClass};
use std::collections::HashMap;

/// Residue-name lookup table used to classify records into polymer, water, ion, and organic
/// groups.
///
/// Names not registered in the table fall back to the record kind: `ATOM` records are
/// treated as polymer and `HETATM` records as organic.
#[derive(Debug, Clone)]
pub struct ResidueContext {
    class_map: HashMap<String, ResidueClass>,
}

impl ResidueContext {
    pub fn new_default() -> Self {
        let mut class_map = HashMap::new();

        macro_rules! register {
            ($class:expr, [$($name:expr),* $(,)?]) => {
                $(class_map.insert($name.to_string(), $class);)*
            };
        }

        register!(
            ResidueClass::Polymer,
            [
                "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE", "LEU",
                "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL", "SEC", "PYL",
                "MSE", "ARN", "ASH", "CYM", "CYX", "GLH", "HID", "HIE", "HIP", "LYN", "TYM",
                "ACE", "NME", "DA", "DC", "DG", "DT", "DI", "A", "C", "G", "U", "I",
            ]
        );

        register!(
            ResidueClass::Water,
            ["HOH", "WAT", "H2O", "DOD", "SOL", "TIP", "TIP3", "TIP4", "TP3", "SPC"]
        );

        register!(
            ResidueClass::Ion,
            [
                "NA", "K", "LI", "RB", "CS", "MG", "CA", "SR", "BA", "ZN", "FE", "FE2", "MN",
                "MN3", "CU", "CU1", "CO", "NI", "CD", "HG", "PT", "AU", "AG", "AL", "CL", "BR",
                "IOD", "F",
            ]
        );

        Self { class_map }
    }

    /// Registers or overrides the class of a residue name.
    pub fn register(&mut self, name: impl Into<String>, class: ResidueClass) {
        self.class_map.insert(name.into(), class);
    }

    /// Looks up a residue name without any record-kind fallback.
    pub fn lookup(&self, residue_name: &str) -> Option<ResidueClass> {
        self.class_map.get(residue_name.trim()).copied()
    }

    /// Classifies a coordinate record; non-coordinate records yield `None`.
    pub fn classify(&self, record: &Record) -> Option<ResidueClass> {
        if !record.is_coordinate() {
            return None;
        }
        let known = record.residue_name().and_then(|name| self.lookup(name));
        Some(known.unwrap_or(match record.kind() {
            RecordKind::Atom => ResidueClass::Polymer,
            _ => ResidueClass::Organic,
        }))
    }

    pub fn is_water(&self, record: &Record) -> bool {
        self.classify(record) == Some(ResidueClass::Water)
    }

    /// Small-molecule atoms: coordinate records whose residue name is not registered as
    /// polymer, water or ion. The record kind is ignored, so docking output that writes a
    /// ligand as `ATOM ... UNL` still counts.
    pub fn is_organic(&self, record: &Record) -> bool {
        record.is_coordinate()
            && record.residue_name().is_some_and(|name| {
                matches!(self.lookup(name), None | Some(ResidueClass::Organic))
            })
    }
}

impl Default for ResidueContext {
    fn default() -> Self {
        Self::new_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hetatm(res_name: &str) -> Record {
        Record::parse(&format!(
            "HETATM    1  X   {:>3} A   1       0.000   0.000   0.000  1.00  0.00           X",
            res_name
        ))
    }

    #[test]
    fn classifies_known_residue_names() {
        let context = ResidueContext::new_default();

        assert_eq!(context.lookup("ALA"), Some(ResidueClass::Polymer));
        assert_eq!(context.lookup("WAT"), Some(ResidueClass::Water));
        assert_eq!(context.lookup("ZN"), Some(ResidueClass::Ion));
        assert_eq!(context.lookup("SB4"), None);
    }

    #[test]
    fn unknown_hetatm_residues_are_organic() {
        let context = ResidueContext::new_default();

        assert_eq!(context.classify(&hetatm("SB4")), Some(ResidueClass::Organic));
        assert!(context.is_organic(&hetatm("HEM")));
        assert!(!context.is_organic(&hetatm("HOH")));
        assert!(context.is_water(&hetatm("HOH")));
        assert!(!context.is_organic(&hetatm(" ZN")));
    }

    #[test]
    fn unknown_atom_residues_are_polymer() {
        let context = ResidueContext::new_default();
        let record = Record::parse(
            "ATOM      1  N   XYZ A   1       0.000   0.000   0.000  1.00  0.00           N",
        );

        assert_eq!(context.classify(&record), Some(ResidueClass::Polymer));
    }

    #[test]
    fn organic_ignores_record_kind() {
        let context = ResidueContext::new_default();
        let unl = Record::parse(
            "ATOM      1  C1  UNL A   1       0.000   0.000   0.000  1.00  0.00           C",
        );
        let ala = Record::parse(
            "ATOM      2  CA  ALA A   1       0.000   0.000   0.000  1.00  0.00           C",
        );

        assert!(context.is_organic(&unl));
        assert!(!context.is_organic(&ala));
        assert!(!context.is_organic(&Record::parse("REMARK UNL")));
    }

    #[test]
    fn other_records_are_unclassified() {
        let context = ResidueContext::new_default();
        assert_eq!(context.classify(&Record::parse("END")), None);
    }

    #[test]
    fn register_overrides_defaults() {
        let mut context = ResidueContext::new_default();
        context.register("CA", ResidueClass::Organic);

        assert_eq!(context.lookup("CA"), Some(ResidueClass::Organic));
    }
}
