//! Batch audits over many reported statistics.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use grim_core::{stable_hash_string, to_canonical_json_bytes, ErrorInfo, GrimError, ReportedStatistic};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::opts::AuditOpts;
use crate::verdict::{check_consistency, VerdictRecord};

fn io_error(code: &str, err: impl ToString) -> GrimError {
    GrimError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// Result of one row of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// The row was audited.
    Verdict {
        /// Full verdict record.
        record: Box<VerdictRecord>,
    },
    /// The row could not be audited.
    Error {
        /// Validation error raised for the row.
        error: GrimError,
    },
}

/// One row of a batch report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Position of the row in the input.
    pub index: usize,
    /// Caller supplied label, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Outcome of the row.
    pub outcome: BatchOutcome,
}

impl BatchEntry {
    /// Verdict name, or `ERROR` when the row was rejected.
    pub fn status(&self) -> String {
        match &self.outcome {
            BatchOutcome::Verdict { record } => record.verdict.to_string(),
            BatchOutcome::Error { .. } => "ERROR".to_string(),
        }
    }
}

/// Ordered outcomes of a batch with per-status tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Entries in input order.
    pub entries: Vec<BatchEntry>,
    /// Number of entries per status.
    pub tallies: BTreeMap<String, usize>,
    /// Content hash of entries and tallies.
    pub analysis_hash: String,
}

impl BatchReport {
    fn new(entries: Vec<BatchEntry>) -> Result<Self, GrimError> {
        let mut tallies = BTreeMap::new();
        for entry in &entries {
            *tallies.entry(entry.status()).or_insert(0) += 1;
        }
        let analysis_hash = stable_hash_string(&(&entries, &tallies))?;
        Ok(Self {
            entries,
            tallies,
            analysis_hash,
        })
    }
}

/// Audits every statistic on a pool of `opts.concurrency` workers.
///
/// Rows are independent: a row failing validation is recorded as an error
/// entry and the batch carries on. Output order matches input order whatever
/// the worker count.
pub fn check_batch(
    stats: &[ReportedStatistic],
    opts: &AuditOpts,
) -> Result<BatchReport, GrimError> {
    opts.validate()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.concurrency.max(1))
        .build()
        .map_err(|err| io_error("thread-pool", err))?;

    let mut entries: Vec<BatchEntry> = pool.install(|| {
        stats
            .par_iter()
            .enumerate()
            .map(|(index, stat)| {
                let outcome = match check_consistency(stat, opts) {
                    Ok(record) => BatchOutcome::Verdict {
                        record: Box::new(record),
                    },
                    Err(error) => {
                        tracing::debug!(index, code = %error.info().code, "row rejected");
                        BatchOutcome::Error { error }
                    }
                };
                BatchEntry {
                    index,
                    label: stat.label.clone(),
                    outcome,
                }
            })
            .collect()
    });
    entries.sort_by_key(|entry| entry.index);

    let report = BatchReport::new(entries)?;
    tracing::debug!(rows = stats.len(), hash = %report.analysis_hash, "batch audited");
    Ok(report)
}

/// Audits a batch and writes `batch_report.json` under `out`.
pub fn run_batch(
    stats: &[ReportedStatistic],
    out: &Path,
    opts: &AuditOpts,
) -> Result<BatchReport, GrimError> {
    fs::create_dir_all(out).map_err(|err| io_error("batch-out-dir", err))?;
    let report = check_batch(stats, opts)?;
    let bytes = to_canonical_json_bytes(&report)?;
    fs::write(out.join("batch_report.json"), bytes)
        .map_err(|err| io_error("batch-report-write", err))?;
    Ok(report)
}
