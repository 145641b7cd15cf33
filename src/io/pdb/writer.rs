use crate::io::error::Error;
use crate::model::fragment::Fragment;
use std::io::Write;

/// Writes every record of `fragment`, one newline-terminated line each, in stored order.
pub fn write<W: Write>(mut writer: W, fragment: &Fragment) -> Result<(), Error> {
    for record in fragment.iter_records() {
        writeln!(writer, "{}", record.line()).map_err(|e| Error::from_io(e, None))?;
    }
    writer.flush().map_err(|e| Error::from_io(e, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::pdb::reader::read;
    use std::io::Cursor;

    #[test]
    fn write_after_read_is_byte_identical() {
        let input = "\
REMARK   2 RESOLUTION.    2.10 ANGSTROMS.
ATOM      1  N   ALA A   1      10.000  20.000  30.000  1.00 20.00           N
ATOM      2  CA  ALA A   1
TER
END
";
        let fragment = read(Cursor::new(input)).unwrap();
        let mut out = Vec::new();
        write(&mut out, &fragment).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), input);
    }
}
