use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use grim_core::to_canonical_json_bytes;
use grim_engine::{check_consistency, VerdictRecord};

use super::load_opts;
use crate::input::StatisticRow;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Sample size.
    #[arg(long)]
    pub n: u64,
    /// Mean exactly as printed.
    #[arg(long)]
    pub mean: String,
    /// Standard deviation exactly as printed.
    #[arg(long)]
    pub sd: Option<String>,
    /// Decimal places the mean was rounded to; inferred from the display when omitted.
    #[arg(long, allow_hyphen_values = true)]
    pub decimals: Option<i64>,
    /// Decimal places the SD was rounded to; defaults to the mean's.
    #[arg(long, allow_hyphen_values = true)]
    pub sd_decimals: Option<i64>,
    /// Smallest admissible response, or `none` for no lower bound; defaults to 0.
    #[arg(long, allow_hyphen_values = true)]
    pub scale_min: Option<String>,
    /// Largest admissible response.
    #[arg(long, allow_hyphen_values = true)]
    pub scale_max: Option<i64>,
    /// Items averaged per subject.
    #[arg(long)]
    pub items: Option<u32>,
    /// Variance denominator: population, sample or unspecified.
    #[arg(long)]
    pub denominator: Option<String>,
    /// Free-form label echoed in the record.
    #[arg(long)]
    pub label: Option<String>,
    /// YAML file with audit options.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Print the canonical JSON record instead of a summary.
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    fn row(&self) -> StatisticRow {
        StatisticRow {
            n: self.n,
            mean: self.mean.clone(),
            decimals: self.decimals,
            sd: self.sd.clone(),
            sd_decimals: self.sd_decimals,
            scale_min: self.scale_min.clone(),
            scale_max: self.scale_max,
            items: self.items,
            denominator: self.denominator.clone(),
            label: self.label.clone(),
        }
    }
}

fn summary(record: &VerdictRecord) -> String {
    let mut lines = vec![record.verdict.to_string()];
    lines.extend(record.reasons.iter().map(|reason| format!("  - {reason}")));
    for candidate in &record.candidates {
        let mut line = format!("  sum {} (mean {})", candidate.sum, candidate.mean);
        if let Some(ss) = candidate.sum_of_squares {
            let proof = if candidate.exact { "witnessed" } else { "bounds" };
            line.push_str(&format!(", sum of squares {ss} [{proof}]"));
        }
        lines.push(line);
    }
    lines.push(format!("analysis hash {}", record.analysis_hash));
    lines.join("\n")
}

/// Audits one statistic and prints the outcome.
pub fn run(args: &CheckArgs) -> Result<(), Box<dyn Error>> {
    let opts = load_opts(args.config.as_deref())?;
    let stat = args.row().into_statistic()?;
    let record = check_consistency(&stat, &opts)?;
    if args.json {
        println!("{}", String::from_utf8(to_canonical_json_bytes(&record)?)?);
    } else {
        println!("{}", summary(&record));
    }
    Ok(())
}
