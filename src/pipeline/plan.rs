//! Batch preparation plans read from TOML.

use super::error::Error;
use crate::ops::RetentionSet;
use crate::services::JobResources;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// How batch jobs are dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitMode {
    #[default]
    Slurm,
    Local,
}

/// Settings shared by every job script of a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    #[serde(flatten)]
    pub resources: JobResources,
    /// Shell lines run before each command, such as environment activation.
    pub setup: Vec<String>,
    /// Executable invoked by the job commands.
    pub program: String,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            resources: JobResources::default(),
            setup: Vec::new(),
            program: "protprep".to_string(),
        }
    }
}

/// One structure to prepare.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrepEntry {
    #[serde(default)]
    pub pdb_id: String,
    #[serde(default)]
    pub chain: String,
    #[serde(flatten)]
    pub retain: RetentionSet,
}

impl PrepEntry {
    pub fn new(pdb_id: impl Into<String>, chain: impl Into<String>) -> Self {
        Self {
            pdb_id: pdb_id.into(),
            chain: chain.into(),
            retain: RetentionSet::default(),
        }
    }

    pub fn with_retention(mut self, retain: RetentionSet) -> Self {
        self.retain = retain;
        self
    }

    /// Checks the identifiers every stage depends on.
    pub fn validate(&self) -> Result<(), Error> {
        if self.pdb_id.trim().is_empty() {
            return Err(Error::missing("pdb_id"));
        }
        if self.chain.trim().is_empty() {
            return Err(Error::missing("chain"));
        }
        Ok(())
    }

    pub fn pdb_id(&self) -> &str {
        self.pdb_id.trim()
    }

    pub fn chain(&self) -> &str {
        self.chain.trim()
    }
}

/// A whole preparation run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PrepPlan {
    pub work_dir: PathBuf,
    pub log_dir: PathBuf,
    pub submit: SubmitMode,
    /// Download entries; when off, `<pdb_id>.pdb` must already exist in `work_dir`.
    pub fetch: bool,
    /// Queue the water job after the hydrogen job.
    pub add_water: bool,
    pub batch: BatchSettings,
    #[serde(rename = "entry")]
    pub entries: Vec<PrepEntry>,
}

impl Default for PrepPlan {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            log_dir: PathBuf::from("protprep_logging"),
            submit: SubmitMode::default(),
            fetch: true,
            add_water: true,
            batch: BatchSettings::default(),
            entries: Vec::new(),
        }
    }
}

impl PrepPlan {
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|e| Error::plan_read(e, path))?;
        Self::from_toml_str(&text)
    }
}
