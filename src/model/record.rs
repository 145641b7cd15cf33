//! Fixed-width PDB records with permissive, offset-driven field extraction.
//!
//! A [`Record`] is parsed once from a single text line and never mutated afterwards. Every
//! coordinate field is optional: a line that is too short for a column simply leaves the
//! matching field empty, which keeps `TER`, `END`, and truncated vendor lines flowing through
//! the pipeline without errors. The original text is retained so untouched records can be
//! written back byte-for-byte.

use super::types::{Point, RecordKind};
use smol_str::SmolStr;
use std::fmt;
use std::ops::Range;

/// Column offsets (zero-based, end-exclusive) of the PDB `ATOM`/`HETATM` layout.
pub mod columns {
    use std::ops::Range;

    pub const RECORD_NAME: Range<usize> = 0..6;
    pub const SERIAL: Range<usize> = 6..11;
    pub const ATOM_NAME: Range<usize> = 12..16;
    pub const ALT_LOC: usize = 16;
    pub const RESIDUE_NAME: Range<usize> = 17..20;
    pub const CHAIN_ID: usize = 21;
    pub const RESIDUE_SEQ: Range<usize> = 22..26;
    pub const INSERTION_CODE: usize = 26;
    pub const X: Range<usize> = 30..38;
    pub const Y: Range<usize> = 38..46;
    pub const Z: Range<usize> = 46..54;
    pub const OCCUPANCY: Range<usize> = 54..60;
    pub const TEMP_FACTOR: Range<usize> = 60..66;
    pub const ELEMENT: Range<usize> = 76..78;
}

/// One line of a structure file.
///
/// `ATOM` and `HETATM` lines expose their fixed-column fields; every other line is carried as
/// opaque text with all fields set to `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: RecordKind,
    serial: Option<i32>,
    atom_name: Option<SmolStr>,
    alt_loc: Option<char>,
    residue_name: Option<SmolStr>,
    chain_id: Option<char>,
    residue_seq: Option<i32>,
    insertion_code: Option<char>,
    pos: Option<Point>,
    occupancy: Option<f64>,
    temp_factor: Option<f64>,
    element: Option<SmolStr>,
    line: String,
}

impl Record {
    /// Parses a single line (without its terminator).
    ///
    /// Parsing never fails. Fields whose columns lie beyond the end of the line, or whose
    /// text does not parse, are left empty.
    ///
    /// # Arguments
    ///
    /// * `line` - Raw text of the record; trailing `\r`/`\n` characters are stripped.
    ///
    /// # Returns
    ///
    /// A [`Record`] that remembers the verbatim text for lossless re-serialization.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let kind = RecordKind::of_line(line);

        if !kind.is_coordinate() {
            return Self::other(line);
        }

        let pos = match (
            parse_number::<f64>(line, columns::X),
            parse_number::<f64>(line, columns::Y),
            parse_number::<f64>(line, columns::Z),
        ) {
            (Some(x), Some(y), Some(z)) => Some(Point::new(x, y, z)),
            _ => None,
        };

        Self {
            kind,
            serial: parse_number(line, columns::SERIAL),
            atom_name: parse_token(line, columns::ATOM_NAME),
            alt_loc: parse_flag(line, columns::ALT_LOC),
            residue_name: parse_token(line, columns::RESIDUE_NAME),
            chain_id: column(line, columns::CHAIN_ID),
            residue_seq: parse_number(line, columns::RESIDUE_SEQ),
            insertion_code: parse_flag(line, columns::INSERTION_CODE),
            pos,
            occupancy: parse_number(line, columns::OCCUPANCY),
            temp_factor: parse_number(line, columns::TEMP_FACTOR),
            element: parse_token(line, columns::ELEMENT),
            line: line.to_string(),
        }
    }

    fn other(line: &str) -> Self {
        Self {
            kind: RecordKind::Other,
            serial: None,
            atom_name: None,
            alt_loc: None,
            residue_name: None,
            chain_id: None,
            residue_seq: None,
            insertion_code: None,
            pos: None,
            occupancy: None,
            temp_factor: None,
            element: None,
            line: line.to_string(),
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn is_coordinate(&self) -> bool {
        self.kind.is_coordinate()
    }

    pub fn serial(&self) -> Option<i32> {
        self.serial
    }

    pub fn atom_name(&self) -> Option<&str> {
        self.atom_name.as_deref()
    }

    pub fn alt_loc(&self) -> Option<char> {
        self.alt_loc
    }

    pub fn residue_name(&self) -> Option<&str> {
        self.residue_name.as_deref()
    }

    /// Raw chain identifier column, `Some(' ')` for a blank chain and `None` when the line
    /// ends before column 22.
    pub fn chain_id(&self) -> Option<char> {
        self.chain_id
    }

    pub fn residue_seq(&self) -> Option<i32> {
        self.residue_seq
    }

    pub fn insertion_code(&self) -> Option<char> {
        self.insertion_code
    }

    pub fn pos(&self) -> Option<Point> {
        self.pos
    }

    pub fn occupancy(&self) -> Option<f64> {
        self.occupancy
    }

    pub fn temp_factor(&self) -> Option<f64> {
        self.temp_factor
    }

    pub fn element(&self) -> Option<&str> {
        self.element.as_deref()
    }

    /// Verbatim text of the record.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Tests whether the trimmed chain column equals `chain`.
    ///
    /// Records without a chain column never match.
    pub fn in_chain(&self, chain: &str) -> bool {
        match self.chain_id {
            Some(c) => {
                let mut buf = [0u8; 4];
                c.encode_utf8(&mut buf).trim() == chain.trim()
            }
            None => false,
        }
    }

    /// Tests whether the trimmed residue name equals `name`.
    pub fn has_residue_name(&self, name: &str) -> bool {
        self.residue_name() == Some(name.trim())
    }

    /// Element symbol, falling back to the leading letters of the atom name.
    pub fn element_symbol(&self) -> Option<&str> {
        if let Some(element) = self.element() {
            return Some(element);
        }
        let name = self.atom_name()?;
        let start = name.find(|c: char| c.is_ascii_alphabetic())?;
        name.get(start..start + 1)
    }

    /// Returns a copy with the serial (and optionally residue sequence) columns rewritten.
    ///
    /// All other columns keep their original text. Lines shorter than the rewritten columns
    /// are padded with spaces first. Non-coordinate records are returned unchanged.
    ///
    /// # Arguments
    ///
    /// * `serial` - New atom serial; values above `99999` wrap like in the PDB writer.
    /// * `residue_seq` - Optional replacement residue number; wraps above `9999`.
    pub fn renumbered(&self, serial: i32, residue_seq: Option<i32>) -> Self {
        if !self.is_coordinate() {
            return self.clone();
        }

        let mut line = self.line.clone();
        splice(&mut line, columns::SERIAL, &format!("{:>5}", serial % 100_000));
        if let Some(seq) = residue_seq {
            splice(&mut line, columns::RESIDUE_SEQ, &format!("{:>4}", seq % 10_000));
        }
        Self::parse(&line)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.line)
    }
}

fn field(line: &str, range: Range<usize>) -> Option<&str> {
    line.get(range)
}

fn column(line: &str, idx: usize) -> Option<char> {
    field(line, idx..idx + 1).and_then(|s| s.chars().next())
}

fn parse_token(line: &str, range: Range<usize>) -> Option<SmolStr> {
    let token = field(line, range)?.trim();
    (!token.is_empty()).then(|| SmolStr::new(token))
}

fn parse_flag(line: &str, idx: usize) -> Option<char> {
    column(line, idx).filter(|c| !c.is_whitespace())
}

fn parse_number<T: std::str::FromStr>(line: &str, range: Range<usize>) -> Option<T> {
    field(line, range)?.trim().parse().ok()
}

fn splice(line: &mut String, range: Range<usize>, value: &str) {
    if line.len() < range.end {
        let missing = range.end - line.len();
        line.extend(std::iter::repeat_n(' ', missing));
    }
    if line.is_char_boundary(range.start) && line.is_char_boundary(range.end) {
        line.replace_range(range, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALA_N: &str =
        "ATOM      1  N   ALA A   1      10.000  20.000  30.000  1.00 20.00           N";
    const HEM_FE: &str =
        "HETATM 4321 FE   HEM A 201      -1.500   2.250   3.125  1.00 15.30          FE";

    #[test]
    fn parses_all_atom_fields() {
        let record = Record::parse(ALA_N);

        assert_eq!(record.kind(), RecordKind::Atom);
        assert_eq!(record.serial(), Some(1));
        assert_eq!(record.atom_name(), Some("N"));
        assert_eq!(record.residue_name(), Some("ALA"));
        assert_eq!(record.chain_id(), Some('A'));
        assert_eq!(record.residue_seq(), Some(1));
        assert_eq!(record.pos(), Some(Point::new(10.0, 20.0, 30.0)));
        assert_eq!(record.occupancy(), Some(1.0));
        assert_eq!(record.temp_factor(), Some(20.0));
        assert_eq!(record.element(), Some("N"));
        assert_eq!(record.line(), ALA_N);
    }

    #[test]
    fn parses_hetatm_fields() {
        let record = Record::parse(HEM_FE);

        assert_eq!(record.kind(), RecordKind::Hetatm);
        assert_eq!(record.serial(), Some(4321));
        assert_eq!(record.atom_name(), Some("FE"));
        assert_eq!(record.residue_name(), Some("HEM"));
        assert_eq!(record.residue_seq(), Some(201));
        assert_eq!(record.pos(), Some(Point::new(-1.5, 2.25, 3.125)));
        assert_eq!(record.element(), Some("FE"));
    }

    #[test]
    fn column_offsets_match_fixed_layout() {
        assert_eq!(&ALA_N[columns::SERIAL], "    1");
        assert_eq!(&ALA_N[columns::ATOM_NAME], " N  ");
        assert_eq!(&ALA_N[columns::RESIDUE_NAME], "ALA");
        assert_eq!(&ALA_N[columns::CHAIN_ID..columns::CHAIN_ID + 1], "A");
        assert_eq!(&ALA_N[columns::RESIDUE_SEQ], "   1");
        assert_eq!(&ALA_N[columns::X], "  10.000");
        assert_eq!(&ALA_N[columns::Y], "  20.000");
        assert_eq!(&ALA_N[columns::Z], "  30.000");
        assert_eq!(&ALA_N[columns::ELEMENT], " N");
    }

    #[test]
    fn other_records_keep_text_and_have_no_fields() {
        let record = Record::parse("REMARK VINA RESULT:    -7.5      0.000      0.000");

        assert_eq!(record.kind(), RecordKind::Other);
        assert_eq!(record.serial(), None);
        assert_eq!(record.chain_id(), None);
        assert_eq!(record.line(), "REMARK VINA RESULT:    -7.5      0.000      0.000");
    }

    #[test]
    fn short_lines_leave_fields_empty_without_failing() {
        let record = Record::parse("ATOM      1  N   ALA");

        assert_eq!(record.kind(), RecordKind::Atom);
        assert_eq!(record.serial(), Some(1));
        assert_eq!(record.residue_name(), Some("ALA"));
        assert_eq!(record.chain_id(), None);
        assert_eq!(record.residue_seq(), None);
        assert_eq!(record.pos(), None);
        assert!(!record.in_chain("A"));
    }

    #[test]
    fn line_ending_exactly_at_chain_column_has_chain() {
        let record = Record::parse("ATOM      1  N   ALA B");
        assert_eq!(record.chain_id(), Some('B'));
        assert!(record.in_chain("B"));
    }

    #[test]
    fn blank_chain_matches_only_blank_request() {
        let line = "HETATM    1 ZN    ZN   301       0.000   0.000   0.000  1.00  0.00          ZN";
        let record = Record::parse(line);

        assert_eq!(record.chain_id(), Some(' '));
        assert!(!record.in_chain("A"));
        assert!(record.in_chain(""));
    }

    #[test]
    fn strips_line_terminators() {
        let record = Record::parse("END\r\n");
        assert_eq!(record.line(), "END");
    }

    #[test]
    fn renumbered_rewrites_only_numbering_columns() {
        let record = Record::parse(ALA_N).renumbered(1234, Some(56));

        assert_eq!(record.serial(), Some(1234));
        assert_eq!(record.residue_seq(), Some(56));
        assert_eq!(record.atom_name(), Some("N"));
        assert_eq!(record.pos(), Some(Point::new(10.0, 20.0, 30.0)));
        assert_eq!(record.line().len(), ALA_N.len());
        assert_eq!(&record.line()[26..], &ALA_N[26..]);
    }

    #[test]
    fn renumbered_pads_short_lines() {
        let record = Record::parse("ATOM      7  CA  GLY").renumbered(8, Some(3));

        assert_eq!(record.serial(), Some(8));
        assert_eq!(record.residue_seq(), Some(3));
        assert_eq!(record.line().len(), 26);
    }

    #[test]
    fn renumbered_leaves_other_records_untouched() {
        let record = Record::parse("TER");
        assert_eq!(record.renumbered(10, Some(2)), record);
    }

    #[test]
    fn element_symbol_falls_back_to_atom_name() {
        let record = Record::parse("ATOM      2  CA  ALA A   1      11.000  20.000  30.000");
        assert_eq!(record.element(), None);
        assert_eq!(record.element_symbol(), Some("C"));
    }
}
