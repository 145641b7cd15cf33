use super::{Error, run_checked};
use serde::Deserialize;
use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Resource request written into every batch script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JobResources {
    pub ntasks: u32,
    pub cpus_per_task: u32,
    pub ntasks_per_node: u32,
    /// Wall-clock limit as `HH:MM:SS`.
    pub time: String,
    pub mem_per_cpu: String,
}

impl Default for JobResources {
    fn default() -> Self {
        Self {
            ntasks: 1,
            cpus_per_task: 1,
            ntasks_per_node: 1,
            time: "00:10:00".to_string(),
            mem_per_cpu: "2G".to_string(),
        }
    }
}

/// Identifier assigned by the queue to a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single batch job: resources, environment setup and one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobScript {
    pub job_name: String,
    pub resources: JobResources,
    /// Shell lines run before the command, such as module loads.
    pub setup: Vec<String>,
    pub command: String,
    /// Job that must finish successfully first.
    pub dependency: Option<JobId>,
}

impl JobScript {
    pub fn new(job_name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            resources: JobResources::default(),
            setup: Vec::new(),
            command: command.into(),
            dependency: None,
        }
    }

    pub fn with_resources(mut self, resources: JobResources) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_setup(mut self, setup: Vec<String>) -> Self {
        self.setup = setup;
        self
    }

    pub fn after_ok(mut self, job: JobId) -> Self {
        self.dependency = Some(job);
        self
    }

    /// Log file the queue writes the job's output to.
    pub fn output_log(&self) -> String {
        format!("{}.txt", self.job_name)
    }

    pub fn script_file_name(&self) -> String {
        format!("{}.sh", self.job_name)
    }

    /// Renders the job as an sbatch script.
    pub fn render(&self) -> String {
        let r = &self.resources;
        let mut script = String::from("#!/bin/bash\n#\n");
        let _ = writeln!(script, "#SBATCH --job-name={}", self.job_name);
        let _ = writeln!(script, "#SBATCH --output={}", self.output_log());
        script.push_str("#\n");
        let _ = writeln!(script, "#SBATCH --ntasks={}", r.ntasks);
        let _ = writeln!(script, "#SBATCH --cpus-per-task={}", r.cpus_per_task);
        let _ = writeln!(script, "#SBATCH --ntasks-per-node={}", r.ntasks_per_node);
        let _ = writeln!(script, "#SBATCH --time={}", r.time);
        let _ = writeln!(script, "#SBATCH --mem-per-cpu={}", r.mem_per_cpu);
        if let Some(dep) = &self.dependency {
            let _ = writeln!(script, "#SBATCH --dependency=afterok:{}", dep);
        }
        script.push('\n');
        for line in &self.setup {
            let _ = writeln!(script, "{}", line);
        }
        let _ = writeln!(script, "{}", self.command);
        script
    }

    /// Writes the rendered script as `<job_name>.sh` in `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, Error> {
        let path = dir.join(self.script_file_name());
        fs::write(&path, self.render()).map_err(|e| Error::file(e, &path))?;
        Ok(path)
    }
}

/// Queue front end.
pub trait BatchSubmitter {
    fn submit(&mut self, script: &JobScript) -> Result<JobId, Error>;

    /// Submits `script` so that it only starts after `predecessor` succeeded.
    fn submit_with_dependency(
        &mut self,
        script: JobScript,
        predecessor: &JobId,
    ) -> Result<JobId, Error> {
        self.submit(&script.after_ok(predecessor.clone()))
    }
}

/// Result of a two-stage submission where the second job depends on the first.
#[derive(Debug)]
pub enum ChainOutcome {
    Queued { first: JobId, second: JobId },
    /// The first job was rejected and the second was never submitted.
    FirstRejected(Error),
    SecondRejected { first: JobId, error: Error },
}

impl ChainOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, ChainOutcome::Queued { .. })
    }
}

/// Submits `first`, then `second` with an `afterok` dependency on it.
pub fn submit_chain<S: BatchSubmitter + ?Sized>(
    submitter: &mut S,
    first: &JobScript,
    second: JobScript,
) -> ChainOutcome {
    let first_id = match submitter.submit(first) {
        Ok(id) => id,
        Err(error) => {
            warn!(
                job = %first.job_name,
                dependent = %second.job_name,
                %error,
                "dependent job not submitted"
            );
            return ChainOutcome::FirstRejected(error);
        }
    };
    match submitter.submit_with_dependency(second, &first_id) {
        Ok(second) => ChainOutcome::Queued {
            first: first_id,
            second,
        },
        Err(error) => ChainOutcome::SecondRejected {
            first: first_id,
            error,
        },
    }
}

/// Slurm submission through `sbatch --parsable`.
#[derive(Debug, Clone)]
pub struct SlurmSubmitter {
    work_dir: PathBuf,
    program: PathBuf,
}

impl SlurmSubmitter {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            program: PathBuf::from("sbatch"),
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

/// Extracts the job id from `sbatch` output, parsable (`123;cluster`) or not.
fn parse_job_id(stdout: &str) -> Option<JobId> {
    let first = stdout.trim().split(';').next()?;
    let id = first.split_whitespace().last()?;
    (!id.is_empty()).then(|| JobId::new(id))
}

impl BatchSubmitter for SlurmSubmitter {
    fn submit(&mut self, script: &JobScript) -> Result<JobId, Error> {
        let path = script.write_to(&self.work_dir)?;
        let output = run_checked(
            Command::new(&self.program)
                .arg("--parsable")
                .arg(&path)
                .current_dir(&self.work_dir),
        )
        .map_err(|err| match err {
            Error::CommandFailed { stderr, .. } => Error::batch_rejected(&script.job_name, stderr),
            other => other,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let id = parse_job_id(&stdout).ok_or_else(|| {
            Error::batch_rejected(&script.job_name, "sbatch printed no job id")
        })?;
        info!(job = %script.job_name, id = %id, "submitted batch job");
        Ok(id)
    }
}

/// Runs each script immediately with `bash`, in submission order.
///
/// Because jobs run to completion before `submit` returns, dependencies are satisfied by
/// construction.
#[derive(Debug, Clone)]
pub struct LocalSubmitter {
    work_dir: PathBuf,
    shell: PathBuf,
    submitted: usize,
}

impl LocalSubmitter {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            shell: PathBuf::from("bash"),
            submitted: 0,
        }
    }

    pub fn with_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }
}

impl BatchSubmitter for LocalSubmitter {
    fn submit(&mut self, script: &JobScript) -> Result<JobId, Error> {
        let path = script.write_to(&self.work_dir)?;
        let output = run_checked(
            Command::new(&self.shell)
                .arg(&path)
                .current_dir(&self.work_dir),
        )
        .map_err(|err| match err {
            Error::CommandFailed { stderr, status, .. } => {
                Error::batch_rejected(&script.job_name, format!("{}: {}", status, stderr))
            }
            other => other,
        })?;

        let log = self.work_dir.join(script.output_log());
        let mut text = output.stdout;
        text.extend_from_slice(&output.stderr);
        fs::write(&log, text).map_err(|e| Error::file(e, &log))?;

        self.submitted += 1;
        let id = JobId::new(format!("local-{}", self.submitted));
        info!(job = %script.job_name, id = %id, "ran job locally");
        Ok(id)
    }
}
