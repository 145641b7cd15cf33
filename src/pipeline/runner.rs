use super::error::Error;
use super::plan::{PrepEntry, PrepPlan};
use super::stage::Stage;
use crate::ops::{self, solvated_output_path};
use crate::services::{
    BatchSubmitter, ChainOutcome, JobId, JobScript, StructureFetcher, fetch_to_file,
    submit_chain,
};
use std::path::Path;
use tracing::{error, info, info_span};

/// Outcome of one entry of a batch run.
#[derive(Debug)]
pub struct EntryReport {
    pub pdb_id: String,
    /// Last stage reached; queued stages count once their job was accepted.
    pub reached: Option<Stage>,
    /// Accepted jobs by name.
    pub jobs: Vec<(String, JobId)>,
    pub error: Option<Error>,
}

impl EntryReport {
    fn new(pdb_id: &str) -> Self {
        Self {
            pdb_id: pdb_id.to_string(),
            reached: None,
            jobs: Vec::new(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Drives every entry of a [`PrepPlan`] through download, chain filtering and job submission.
///
/// Filtering runs in-process; ligand isolation, hydrogen addition and solvation are queued as
/// batch jobs that call back into the `protprep` binary. A failing entry is reported and the
/// run moves on to the next one.
#[derive(Debug, Clone)]
pub struct Pipeline {
    plan: PrepPlan,
}

impl Pipeline {
    pub fn new(plan: PrepPlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &PrepPlan {
        &self.plan
    }

    pub fn run_all<F, S>(&self, fetcher: &F, submitter: &mut S) -> Vec<EntryReport>
    where
        F: StructureFetcher + ?Sized,
        S: BatchSubmitter + ?Sized,
    {
        let reports: Vec<EntryReport> = self
            .plan
            .entries
            .iter()
            .map(|entry| self.run_entry(entry, fetcher, submitter))
            .collect();

        let failed = reports.iter().filter(|r| !r.is_success()).count();
        info!(entries = reports.len(), failed, "preparation run finished");
        reports
    }

    /// Runs one entry inside its own `entry` span; failures are captured in the report.
    pub fn run_entry<F, S>(&self, entry: &PrepEntry, fetcher: &F, submitter: &mut S) -> EntryReport
    where
        F: StructureFetcher + ?Sized,
        S: BatchSubmitter + ?Sized,
    {
        let span = info_span!("entry", pdb_id = %entry.pdb_id());
        let _guard = span.enter();

        let mut report = EntryReport::new(entry.pdb_id());
        if let Err(err) = self.advance(entry, fetcher, submitter, &mut report) {
            error!(
                reached = ?report.reached,
                error = %err,
                "entry stopped"
            );
            report.error = Some(err);
        }
        report
    }

    fn advance<F, S>(
        &self,
        entry: &PrepEntry,
        fetcher: &F,
        submitter: &mut S,
        report: &mut EntryReport,
    ) -> Result<(), Error>
    where
        F: StructureFetcher + ?Sized,
        S: BatchSubmitter + ?Sized,
    {
        entry.validate()?;
        let pdb_id = entry.pdb_id();
        let chain = entry.chain();
        let work_dir = &self.plan.work_dir;

        let raw = if self.plan.fetch {
            fetch_to_file(fetcher, pdb_id, work_dir)
                .map_err(|e| Error::service(Stage::Downloaded, e))?
        } else {
            work_dir.join(format!("{}.pdb", pdb_id))
        };
        report.reached = Some(Stage::Downloaded);

        let cleaned = ops::filter_chain_file(&raw, chain, &entry.retain)
            .map_err(|e| Error::ops(Stage::ChainFiltered, e))?;
        report.reached = Some(Stage::ChainFiltered);

        match entry.retain.ligand.as_deref().map(str::trim) {
            Some(ligand) if !ligand.is_empty() => {
                let job = self.script(
                    format!("extracting_lig_{}", pdb_id),
                    format!(
                        "ligand --input {} --pdb-id {} --chain {} --ligand {} --out-dir .",
                        file_name(&raw),
                        pdb_id,
                        chain,
                        ligand
                    ),
                );
                let id = submitter
                    .submit(&job)
                    .map_err(|e| Error::service(Stage::LigandExtracted, e))?;
                report.jobs.push((job.job_name, id));
                report.reached = Some(Stage::LigandExtracted);
            }
            _ => info!("no ligand to keep; skipping ligand extraction"),
        }

        let hydro = self.script(
            format!("rec_protein_{}_add_h", pdb_id),
            format!("hydro --input {}", file_name(&cleaned)),
        );

        if !self.plan.add_water {
            let id = submitter
                .submit(&hydro)
                .map_err(|e| Error::service(Stage::HydrogenAdded, e))?;
            report.jobs.push((hydro.job_name, id));
            report.reached = Some(Stage::HydrogenAdded);
            return Ok(());
        }

        let water = self.script(
            format!("rec_protein_{}_add_water", pdb_id),
            format!(
                "solvate --input {} --output {}",
                file_name(&cleaned),
                file_name(&solvated_output_path(&cleaned))
            ),
        );
        let water_name = water.job_name.clone();
        match submit_chain(submitter, &hydro, water) {
            ChainOutcome::Queued { first, second } => {
                report.jobs.push((hydro.job_name, first));
                report.jobs.push((water_name, second));
                report.reached = Some(Stage::WaterAdded);
                Ok(())
            }
            ChainOutcome::FirstRejected(err) => Err(Error::service(Stage::HydrogenAdded, err)),
            ChainOutcome::SecondRejected { first, error } => {
                report.jobs.push((hydro.job_name, first));
                report.reached = Some(Stage::HydrogenAdded);
                Err(Error::service(Stage::WaterAdded, error))
            }
        }
    }

    fn script(&self, job_name: String, arguments: String) -> JobScript {
        let batch = &self.plan.batch;
        JobScript::new(job_name, format!("{} {}", batch.program, arguments))
            .with_resources(batch.resources.clone())
            .with_setup(batch.setup.clone())
    }
}

/// Job commands run inside the work directory, so they refer to files by name.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
