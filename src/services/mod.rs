//! Narrow interfaces to the collaborators around the record engine.
//!
//! Each capability is a trait with one production implementation: object-level structure
//! handling ([`StructureToolkit`]), format conversion ([`FormatConverter`]), batch-queue
//! submission ([`BatchSubmitter`]) and structure download ([`StructureFetcher`]). Tests
//! substitute in-memory fakes.

mod batch;
mod convert;
mod error;
mod fetch;
mod toolkit;

pub use batch::{
    BatchSubmitter, ChainOutcome, JobId, JobResources, JobScript, LocalSubmitter, SlurmSubmitter,
    submit_chain,
};
pub use convert::{FormatConverter, ObabelConverter, PdbqtConverter, StructureFormat};
pub use error::Error;
pub use fetch::{RcsbFetcher, StructureFetcher, fetch_to_file};
pub use toolkit::{NativeToolkit, ObjectHandle, Selector, StructureToolkit};

use std::process::{Command, Output};
use tracing::debug;

/// Runs `command` to completion and turns a non-zero exit into [`Error::CommandFailed`].
pub(crate) fn run_checked(command: &mut Command) -> Result<Output, Error> {
    let program = command.get_program().to_string_lossy().into_owned();
    debug!(program = %program, args = ?command.get_args().collect::<Vec<_>>(), "running external command");

    let output = command
        .output()
        .map_err(|e| Error::spawn(program.clone(), e))?;

    if !output.status.success() {
        return Err(Error::CommandFailed {
            program,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}
