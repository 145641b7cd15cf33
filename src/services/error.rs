use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("batch job '{job_name}' was rejected: {details}")]
    BatchRejected { job_name: String, details: String },

    #[error("failed to fetch structure '{pdb_id}': {details}")]
    Fetch { pdb_id: String, details: String },

    #[error("no object named '{name}' is loaded")]
    UnknownObject { name: String },

    #[error("an object named '{name}' is already loaded")]
    ObjectExists { name: String },

    #[error("{capability} is not available in this toolkit")]
    Unavailable { capability: &'static str },

    #[error("conversion from {from} to {to} is not supported")]
    UnsupportedFormat { from: String, to: String },

    #[error("file error for '{}': {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] crate::io::Error),
}

impl Error {
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    pub fn batch_rejected(job_name: impl Into<String>, details: impl Into<String>) -> Self {
        Self::BatchRejected {
            job_name: job_name.into(),
            details: details.into(),
        }
    }

    pub fn fetch(pdb_id: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Fetch {
            pdb_id: pdb_id.into(),
            details: details.into(),
        }
    }

    pub fn unknown_object(name: impl Into<String>) -> Self {
        Self::UnknownObject { name: name.into() }
    }

    pub fn unsupported_format(from: impl ToString, to: impl ToString) -> Self {
        Self::UnsupportedFormat {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn file(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}
