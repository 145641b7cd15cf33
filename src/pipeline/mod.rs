//! Batch preparation of many PDB entries.
//!
//! A [`PrepPlan`] lists the entries and the queue settings; [`Pipeline`] downloads each
//! structure, filters the requested chain, and queues ligand isolation, hydrogen addition and
//! solvation as dependent batch jobs. Every entry runs in its own tracing span and a failure
//! stops only that entry.

mod error;
mod plan;
mod runner;
mod stage;

pub use error::Error;
pub use plan::{BatchSettings, PrepEntry, PrepPlan, SubmitMode};
pub use runner::{EntryReport, Pipeline};
pub use stage::Stage;
