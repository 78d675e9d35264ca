use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Args;
use grim_engine::{run_batch, BatchOutcome, BatchReport};

use super::load_opts;
use crate::input::load_statistics;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// CSV or JSON file of reported statistics.
    #[arg(long)]
    pub input: PathBuf,
    /// Output directory for `batch_report.json` and `batch_summary.csv`.
    #[arg(long)]
    pub out: PathBuf,
    /// YAML file with audit options.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Worker threads; overrides the options file.
    #[arg(long)]
    pub concurrency: Option<usize>,
}

fn write_summary(path: &Path, report: &BatchReport) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["index", "label", "status", "reasons"])?;
    for entry in &report.entries {
        let reasons = match &entry.outcome {
            BatchOutcome::Verdict { record } => record.reasons.join("; "),
            BatchOutcome::Error { error } => error.to_string(),
        };
        writer.write_record([
            entry.index.to_string(),
            entry.label.clone().unwrap_or_default(),
            entry.status(),
            reasons,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Audits every statistic of the input file and writes the reports.
pub fn run(args: &BatchArgs) -> Result<(), Box<dyn Error>> {
    let mut opts = load_opts(args.config.as_deref())?;
    if let Some(concurrency) = args.concurrency {
        opts.concurrency = concurrency;
    }
    let stats = load_statistics(&args.input)?;
    let report = run_batch(&stats, &args.out, &opts)?;
    write_summary(&args.out.join("batch_summary.csv"), &report)?;
    tracing::info!(
        rows = report.entries.len(),
        hash = %report.analysis_hash,
        "batch written"
    );
    for (status, count) in &report.tallies {
        println!("{status}: {count}");
    }
    Ok(())
}
