use crate::io::error::Error;
use crate::model::fragment::Fragment;
use crate::model::record::{Record, columns};
use std::io::BufRead;

/// Columns shared by PDBQT and PDB coordinate records: everything through the B-factor.
const SHARED_WIDTH: usize = columns::TEMP_FACTOR.end;
const AUTODOCK_TYPE_START: usize = 77;

const TORSION_TREE_TAGS: &[&str] = &["ROOT", "ENDROOT", "BRANCH", "ENDBRANCH", "TORSDOF"];

/// Reads the first pose of a PDBQT stream as plain PDB records.
///
/// Partial charges and AutoDock atom types are replaced by a standard element column,
/// torsion-tree bookkeeping lines are dropped, and reading stops at the end of the first
/// `MODEL` block. The returned fragment is terminated by `END`.
pub fn read<R: BufRead>(reader: R) -> Result<Fragment, Error> {
    let mut records = Vec::new();
    let mut model_seen = false;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::from_io(e, None))?;
        let line = line.trim_end_matches(['\r', '\n']);
        let tag = line.split_whitespace().next().unwrap_or("");

        match tag {
            "MODEL" if model_seen => break,
            "MODEL" => model_seen = true,
            "ENDMDL" => break,
            "END" => break,
            t if TORSION_TREE_TAGS.contains(&t) => {}
            _ if line.starts_with("ATOM") || line.starts_with("HETATM") => {
                records.push(convert_coordinate_line(line, idx + 1)?);
            }
            _ => records.push(Record::parse(line)),
        }
    }

    records.push(Record::parse("END"));
    Ok(Fragment::new(records))
}

fn convert_coordinate_line(line: &str, line_number: usize) -> Result<Record, Error> {
    if line.len() < columns::Z.end {
        return Err(Error::parse(
            "PDBQT",
            None,
            line_number,
            "coordinate record ends before the z column",
        ));
    }

    let shared = line.get(..SHARED_WIDTH.min(line.len())).ok_or_else(|| {
        Error::parse("PDBQT", None, line_number, "non-ASCII text in fixed columns")
    })?;

    let autodock_type = line
        .get(AUTODOCK_TYPE_START..)
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let element = match autodock_type {
        Some(t) => autodock_element(t),
        None => Record::parse(line)
            .atom_name()
            .map(autodock_element)
            .unwrap_or_default(),
    };

    Ok(Record::parse(&format!(
        "{:<width$}          {:>2}",
        shared,
        element,
        width = SHARED_WIDTH
    )))
}

/// Maps an AutoDock atom type to the element symbol written in PDB column 77-78.
pub fn autodock_element(autodock_type: &str) -> String {
    let mapped = match autodock_type {
        "A" | "C" | "G0" | "G1" | "G2" | "G3" | "CG0" | "CG1" | "CG2" | "CG3" => "C",
        "N" | "NA" | "NS" => "N",
        "O" | "OA" | "OS" | "W" => "O",
        "S" | "SA" => "S",
        "H" | "HD" | "HS" => "H",
        _ => "",
    };
    if !mapped.is_empty() {
        return mapped.to_string();
    }

    autodock_type
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .take(2)
        .collect::<String>()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{Point, RecordKind};
    use std::io::Cursor;

    const TWO_POSES: &str = "\
MODEL 1
REMARK VINA RESULT:    -9.1      0.000      0.000
REMARK  Name = SB4
ROOT
ATOM      1  C1  UNL     1       1.000   2.000   3.000  0.00  0.00    +0.123 C 
ENDROOT
BRANCH   1   2
ATOM      2  O2  UNL     1       0.500  -1.250   4.000  0.00  0.00    -0.356 OA
ENDBRANCH   1   2
TORSDOF 1
ENDMDL
MODEL 2
REMARK VINA RESULT:    -8.4      1.200      2.100
ATOM      1  C1  UNL     1       9.000   9.000   9.000  0.00  0.00    +0.123 C 
ENDMDL
";

    #[test]
    fn keeps_only_first_pose() {
        let fragment = read(Cursor::new(TWO_POSES)).unwrap();

        assert_eq!(fragment.atom_count(), 2);
        assert!(
            fragment
                .iter_records()
                .all(|r| !r.line().contains("-8.4"))
        );
        assert_eq!(fragment.records().last().unwrap().line(), "END");
    }

    #[test]
    fn drops_torsion_tree_and_model_lines() {
        let fragment = read(Cursor::new(TWO_POSES)).unwrap();
        let others: Vec<_> = fragment
            .iter_records()
            .filter(|r| r.kind() == RecordKind::Other)
            .map(|r| r.line().to_string())
            .collect();

        assert_eq!(
            others,
            vec![
                "REMARK VINA RESULT:    -9.1      0.000      0.000".to_string(),
                "REMARK  Name = SB4".to_string(),
                "END".to_string(),
            ]
        );
    }

    #[test]
    fn rewrites_element_column() {
        let fragment = read(Cursor::new(TWO_POSES)).unwrap();
        let atoms: Vec<_> = fragment.iter_atoms().collect();

        assert_eq!(
            atoms[0].line(),
            "ATOM      1  C1  UNL     1       1.000   2.000   3.000  0.00  0.00           C"
        );
        assert_eq!(atoms[1].element(), Some("O"));
        assert_eq!(atoms[1].pos(), Some(Point::new(0.5, -1.25, 4.0)));
    }

    #[test]
    fn single_pose_without_model_markers() {
        let input = "ATOM      1 ZN   ZN      1       0.000   0.000   0.000  1.00  0.00     2.000 Zn\n";
        let fragment = read(Cursor::new(input)).unwrap();

        assert_eq!(fragment.atom_count(), 1);
        assert_eq!(fragment.records()[0].element(), Some("ZN"));
    }

    #[test]
    fn truncated_coordinate_record_is_a_parse_error() {
        let err = read(Cursor::new("ATOM      1  C1  UNL     1       1.000\n")).unwrap_err();
        assert!(matches!(err, Error::Parse { line_number: 1, .. }));
    }

    #[test]
    fn maps_autodock_types() {
        assert_eq!(autodock_element("A"), "C");
        assert_eq!(autodock_element("OA"), "O");
        assert_eq!(autodock_element("HD"), "H");
        assert_eq!(autodock_element("SA"), "S");
        assert_eq!(autodock_element("Cl"), "CL");
        assert_eq!(autodock_element("Fe"), "FE");
    }
}
