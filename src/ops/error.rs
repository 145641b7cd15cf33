use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no atomic coordinates found for water placement")]
    EmptyCoordinates,

    #[error("invalid value for '{name}': {details}")]
    InvalidParameter { name: &'static str, details: String },

    #[error("no residue '{ligand}' found on chain '{chain}'")]
    LigandNotFound { ligand: String, chain: String },

    #[error("nothing to combine: no receptor or ligand fragment could be loaded")]
    NothingToCombine,

    #[error("failed to reinject metadata into '{}': {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] crate::io::Error),

    #[error(transparent)]
    Service(#[from] crate::services::Error),
}

impl Error {
    pub fn invalid_parameter(name: &'static str, details: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            details: details.into(),
        }
    }

    pub fn ligand_not_found(ligand: impl Into<String>, chain: impl Into<String>) -> Self {
        Self::LigandNotFound {
            ligand: ligand.into(),
            chain: chain.into(),
        }
    }

    pub fn metadata(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Metadata {
            path: path.into(),
            source,
        }
    }
}
