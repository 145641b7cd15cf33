use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "I/O error for {path_desc}: {source}",
        path_desc = PathDisplay(path)
    )]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "failed to parse {format} {path_desc}: {details} (line {line_number})",
        path_desc = PathDisplay(path)
    )]
    Parse {
        format: &'static str,
        path: Option<PathBuf>,
        line_number: usize,
        details: String,
    },
}

impl Error {
    pub fn from_io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { path, source }
    }

    pub fn parse(
        format: &'static str,
        path: Option<PathBuf>,
        line_number: usize,
        details: impl Into<String>,
    ) -> Self {
        Self::Parse {
            format,
            path,
            line_number,
            details: details.into(),
        }
    }

    /// Attaches a path to errors raised while streaming from an anonymous source.
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        let path = Some(path.into());
        match self {
            Self::Io { source, .. } => Self::Io { path, source },
            Self::Parse {
                format,
                line_number,
                details,
                ..
            } => Self::Parse {
                format,
                path,
                line_number,
                details,
            },
        }
    }
}

struct PathDisplay<'a>(&'a Option<PathBuf>);

impl<'a> fmt::Display for PathDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(p) => write!(f, "file '{}'", p.display()),
            None => write!(f, "stream source"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_mentions_path() {
        let err = Error::from_io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            Some(PathBuf::from("/data/3ERK.pdb")),
        );
        let message = err.to_string();

        assert!(message.contains("file '/data/3ERK.pdb'"));
        assert!(message.contains("missing"));
    }

    #[test]
    fn with_path_replaces_stream_source() {
        let err = Error::parse("PDBQT", None, 12, "bad coordinates").with_path("lig.pdbqt");
        let message = err.to_string();

        assert!(message.contains("file 'lig.pdbqt'"));
        assert!(message.contains("line 12"));
    }
}
