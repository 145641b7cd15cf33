use super::stage::Stage;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing required identifier '{field}'")]
    MissingIdentifier { field: &'static str },

    #[error("failed to read plan '{}': {source}", path.display())]
    PlanRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid plan: {0}")]
    Plan(#[from] toml::de::Error),

    #[error("{stage} step failed: {source}")]
    Ops {
        stage: Stage,
        #[source]
        source: crate::ops::Error,
    },

    #[error("{stage} step failed: {source}")]
    Service {
        stage: Stage,
        #[source]
        source: crate::services::Error,
    },
}

impl Error {
    pub fn missing(field: &'static str) -> Self {
        Self::MissingIdentifier { field }
    }

    pub fn plan_read(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::PlanRead {
            path: path.into(),
            source,
        }
    }

    pub fn ops(stage: Stage, source: crate::ops::Error) -> Self {
        Self::Ops { stage, source }
    }

    pub fn service(stage: Stage, source: crate::services::Error) -> Self {
        Self::Service { stage, source }
    }

    /// Stage that was being attempted, when the failure happened inside one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Ops { stage, .. } | Self::Service { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
