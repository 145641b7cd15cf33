use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use prettytable::{Table, format, row};

use protprep::pipeline::{EntryReport, Pipeline, PrepPlan, SubmitMode};
use protprep::services::{BatchSubmitter, LocalSubmitter, RcsbFetcher, SlurmSubmitter};

/// Runs a TOML preparation plan: download, chain filtering and queued follow-up jobs.
#[derive(Debug, Args)]
pub struct PrepareArgs {
    /// Plan file listing the entries to prepare.
    #[arg(long, value_name = "FILE")]
    pub plan: PathBuf,
    /// Run jobs immediately with bash instead of submitting them to Slurm.
    #[arg(long)]
    pub local: bool,
}

pub fn load_plan(args: &PrepareArgs) -> Result<PrepPlan> {
    let mut plan = PrepPlan::load(&args.plan)
        .with_context(|| format!("Failed to load plan {}", args.plan.display()))?;
    if args.local {
        plan.submit = SubmitMode::Local;
    }
    Ok(plan)
}

pub fn run(plan: PrepPlan) -> Result<()> {
    std::fs::create_dir_all(&plan.work_dir)
        .with_context(|| format!("Failed to create {}", plan.work_dir.display()))?;

    let mut submitter: Box<dyn BatchSubmitter> = match plan.submit {
        SubmitMode::Slurm => Box::new(SlurmSubmitter::new(&plan.work_dir)),
        SubmitMode::Local => Box::new(LocalSubmitter::new(&plan.work_dir)),
    };
    let fetcher = RcsbFetcher::default();

    let reports = Pipeline::new(plan).run_all(&fetcher, submitter.as_mut());
    print_summary(&reports)?;

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        bail!("{} of {} entries failed; see the log for details", failed, reports.len());
    }
    Ok(())
}

fn print_summary(reports: &[EntryReport]) -> Result<()> {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(row!["PDB ID", "Reached", "Jobs", "Status"]);
    for report in reports {
        let reached = report
            .reached
            .map(|stage| stage.to_string())
            .unwrap_or_else(|| "-".to_string());
        let jobs = report
            .jobs
            .iter()
            .map(|(name, id)| format!("{} ({})", name, id))
            .collect::<Vec<_>>()
            .join("\n");
        let status = match &report.error {
            Some(err) => format!("failed: {}", err),
            None => "ok".to_string(),
        };
        table.add_row(row![report.pdb_id, reached, jobs, status]);
    }
    table
        .print(&mut std::io::stdout().lock())
        .context("Failed to render run summary")?;
    Ok(())
}
