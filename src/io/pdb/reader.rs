use crate::io::error::Error;
use crate::model::fragment::Fragment;
use crate::model::record::Record;
use std::io::BufRead;

/// Reads every line of a PDB stream into a [`Fragment`].
///
/// Parsing is permissive: header, `TER`, `END` and truncated lines all become records, and
/// only failures of the underlying reader are reported.
pub fn read<R: BufRead>(reader: R) -> Result<Fragment, Error> {
    let mut records = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(|e| Error::from_io(e, None))?;
        records.push(Record::parse(&line));
    }

    Ok(Fragment::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::RecordKind;
    use std::io::Cursor;

    #[test]
    fn reads_mixed_records_in_order() {
        let input = "\
HEADER    OXIDOREDUCTASE
ATOM      1  N   ALA A   1      10.000  20.000  30.000  1.00 20.00           N
TER
HETATM    2 FE   HEM A 201       0.000   0.000   0.000  1.00 20.00          FE
END
";
        let fragment = read(Cursor::new(input)).unwrap();
        let kinds: Vec<_> = fragment.iter_records().map(|r| r.kind()).collect();

        assert_eq!(
            kinds,
            vec![
                RecordKind::Other,
                RecordKind::Atom,
                RecordKind::Other,
                RecordKind::Hetatm,
                RecordKind::Other,
            ]
        );
    }

    #[test]
    fn handles_crlf_and_missing_final_newline() {
        let input = "REMARK one\r\nATOM      1  N   ALA A   1\r\nEND";
        let fragment = read(Cursor::new(input)).unwrap();

        assert_eq!(fragment.len(), 3);
        assert_eq!(fragment.records()[0].line(), "REMARK one");
        assert_eq!(fragment.records()[1].chain_id(), Some('A'));
        assert_eq!(fragment.records()[2].line(), "END");
    }

    #[test]
    fn empty_stream_yields_empty_fragment() {
        let fragment = read(Cursor::new("")).unwrap();
        assert!(fragment.is_empty());
    }
}
