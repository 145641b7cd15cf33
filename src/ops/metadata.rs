//! Docking score remarks carried from pose files onto prepared structures.
//!
//! Only the first model of a multi-pose file is read. Its model marker is recorded once as
//! `REMARK MODEL <n>`, followed by the allow-listed score remarks in file order.

use crate::io;
use crate::model::fragment::Fragment;
use crate::ops::error::Error;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Remark prefixes collected from the first pose.
pub const METADATA_KEYS: [&str; 6] = [
    "REMARK  Name =",
    "REMARK VINA RESULT:",
    "REMARK INTER + INTRA:",
    "REMARK INTER:",
    "REMARK INTRA:",
    "REMARK UNBOUND:",
];

/// Ordered metadata lines, without line terminators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoseMetadata {
    lines: Vec<String>,
}

impl PoseMetadata {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `content` with every metadata line, newline-terminated, in front of it.
    pub fn prepend_to(&self, content: &str) -> String {
        let mut out = String::with_capacity(
            content.len() + self.lines.iter().map(|l| l.len() + 1).sum::<usize>(),
        );
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(content);
        out
    }
}

/// Extracts the metadata block of the first model.
///
/// Both `MODEL n` and `REMARK MODEL n` start a model. Nothing is collected before the first
/// marker, and collection ends at the next one.
pub fn extract_metadata(fragment: &Fragment) -> PoseMetadata {
    let mut lines = Vec::new();
    let mut started = false;

    for record in fragment.iter_records() {
        let line = record.line().trim();

        if let Some(number) = model_marker(line) {
            if started {
                break;
            }
            started = true;
            lines.push(match number {
                "" => "REMARK MODEL".to_string(),
                n => format!("REMARK MODEL {}", n),
            });
            continue;
        }

        if started && METADATA_KEYS.iter().any(|key| line.starts_with(key)) {
            lines.push(line.to_string());
        }
    }

    PoseMetadata::new(lines)
}

/// Reports whether any line looks like pose metadata, inside a model or not.
pub fn has_metadata(fragment: &Fragment) -> bool {
    fragment.iter_records().any(|record| {
        let line = record.line().trim();
        model_marker(line).is_some() || METADATA_KEYS.iter().any(|key| line.starts_with(key))
    })
}

/// Model number following a `MODEL` or `REMARK MODEL` token, possibly empty.
fn model_marker(line: &str) -> Option<&str> {
    let rest = match line.strip_prefix("REMARK") {
        Some(rest) => rest.trim_start(),
        None => line,
    };
    let number = rest.strip_prefix("MODEL")?;
    if !number.is_empty() && !number.starts_with(char::is_whitespace) {
        return None;
    }
    Some(number.trim())
}

/// Concatenates blocks in order and keeps the first occurrence of each line.
pub fn merge_metadata<'a, I>(blocks: I) -> PoseMetadata
where
    I: IntoIterator<Item = &'a PoseMetadata>,
{
    let mut lines: Vec<String> = Vec::new();
    for line in blocks.into_iter().flat_map(|b| b.lines.iter()) {
        if !lines.contains(line) {
            lines.push(line.clone());
        }
    }
    PoseMetadata::new(lines)
}

/// Reads a pose file and extracts its first-model metadata.
pub fn extract_metadata_file(path: &Path) -> Result<PoseMetadata, Error> {
    Ok(extract_metadata(&io::load_fragment(path)?))
}

/// Rewrites `path` with `metadata` in front of its unchanged content.
///
/// # Errors
///
/// Returns [`Error::Metadata`] when the file cannot be read or written.
pub fn inject_metadata(path: &Path, metadata: &PoseMetadata) -> Result<(), Error> {
    let content = fs::read_to_string(path).map_err(|e| Error::metadata(e, path))?;
    fs::write(path, metadata.prepend_to(&content)).map_err(|e| Error::metadata(e, path))?;
    debug!(path = %path.display(), lines = metadata.len(), "inserted metadata");
    Ok(())
}

/// Like [`inject_metadata`] but logs failures instead of returning them.
///
/// Returns `true` only when the file was rewritten. An empty block leaves the file alone and
/// reports `false`.
pub fn reinject_metadata(path: &Path, metadata: &PoseMetadata) -> bool {
    if metadata.is_empty() {
        return false;
    }
    match inject_metadata(path, metadata) {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "metadata was not reinjected");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSES: &str = "\
MODEL 1
REMARK VINA RESULT:    -9.1      0.000      0.000
REMARK INTER + INTRA:         -12.345
REMARK INTER:                 -10.100
REMARK INTRA:                  -2.245
REMARK UNBOUND:                -2.000
REMARK  Name = SB4
REMARK  7 active torsions:
ATOM      1  C1  UNL     1       1.000   2.000   3.000  0.00  0.00    +0.123 C 
ENDMDL
MODEL 2
REMARK VINA RESULT:    -8.4      1.200      2.100
ENDMDL
";

    #[test]
    fn collects_first_model_only() {
        let metadata = extract_metadata(&Fragment::from_text(POSES));

        assert_eq!(
            metadata.lines(),
            &[
                "REMARK MODEL 1",
                "REMARK VINA RESULT:    -9.1      0.000      0.000",
                "REMARK INTER + INTRA:         -12.345",
                "REMARK INTER:                 -10.100",
                "REMARK INTRA:                  -2.245",
                "REMARK UNBOUND:                -2.000",
                "REMARK  Name = SB4",
            ]
        );
    }

    #[test]
    fn accepts_prefixed_model_marker() {
        let text = "\
REMARK MODEL 1
REMARK VINA RESULT:    -7.0      0.000      0.000
REMARK MODEL 2
REMARK VINA RESULT:    -6.0      0.000      0.000";
        let metadata = extract_metadata(&Fragment::from_text(text));

        assert_eq!(
            metadata.lines(),
            &[
                "REMARK MODEL 1",
                "REMARK VINA RESULT:    -7.0      0.000      0.000"
            ]
        );
    }

    #[test]
    fn ignores_remarks_before_first_model() {
        let text = "REMARK VINA RESULT:    -1.0\nHEADER x\nMODELS are not markers";
        let fragment = Fragment::from_text(text);

        assert!(extract_metadata(&fragment).is_empty());
        assert!(has_metadata(&fragment));
    }

    #[test]
    fn plain_structure_has_no_metadata() {
        let fragment = Fragment::from_text(
            "HEADER    TRANSFERASE\nATOM      1  N   ALA A   1      10.000  20.000  30.000\nEND",
        );
        assert!(!has_metadata(&fragment));
    }

    #[test]
    fn merge_deduplicates_by_first_occurrence() {
        let a = PoseMetadata::new(vec!["REMARK MODEL 1".into(), "REMARK  Name = A".into()]);
        let b = PoseMetadata::new(vec!["REMARK MODEL 1".into(), "REMARK  Name = B".into()]);
        let merged = merge_metadata([&a, &b]);

        assert_eq!(
            merged.lines(),
            &["REMARK MODEL 1", "REMARK  Name = A", "REMARK  Name = B"]
        );
    }

    #[test]
    fn inject_prepends_block_and_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let pose = dir.path().join("pose.pdbqt");
        let target = dir.path().join("complex.pdb");
        let original = "ATOM      1  N   ALA A   1\nEND\n";
        fs::write(&pose, POSES).unwrap();
        fs::write(&target, original).unwrap();

        let metadata = extract_metadata_file(&pose).unwrap();
        inject_metadata(&target, &metadata).unwrap();

        let written = fs::read_to_string(&target).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(&lines[..metadata.len()], metadata.lines());
        assert_eq!(
            written[written.len() - original.len()..].to_string(),
            original
        );
    }

    #[test]
    fn reinject_reports_failure_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.pdb");
        let metadata = PoseMetadata::new(vec!["REMARK MODEL 1".into()]);

        assert!(!reinject_metadata(&missing, &metadata));
        assert!(!missing.exists());
        assert!(!reinject_metadata(&missing, &PoseMetadata::default()));
    }
}
