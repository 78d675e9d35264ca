//! Verdict Aggregator: runs the checks once per interpretation of the paper's
//! rounding and variance conventions and unions the results.

use std::fmt;

use grim_core::{
    stable_hash_string, to_canonical_json_bytes, ErrorInfo, GrimError, ReportedStatistic,
    VarianceDenominator,
};
use serde::{Deserialize, Serialize};

use crate::bracket::{build_brackets, BracketPair, Interval, RoundingConvention};
use crate::envelope::ValueBounds;
use crate::grim::{grim_check, grim_is_informative, CandidateSums, GrimOutcome};
use crate::grimmer::{grimmer_check, integer_window, GrimmerOutcome};
use crate::opts::AuditOpts;
use crate::search::Witness;

/// Final answer of an audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyVerdict {
    /// Some interpretation admits an integer data set reproducing the figures.
    Consistent,
    /// No interpretation admits an integer sum reproducing the mean.
    GrimInconsistent,
    /// The mean is reproducible but no interpretation reproduces the SD.
    GrimmerInconsistent,
    /// The inputs do not determine a bracket, or the audit could not decide.
    Ambiguous,
}

impl fmt::Display for ConsistencyVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConsistencyVerdict::Consistent => "CONSISTENT",
            ConsistencyVerdict::GrimInconsistent => "GRIM_INCONSISTENT",
            ConsistencyVerdict::GrimmerInconsistent => "GRIMMER_INCONSISTENT",
            ConsistencyVerdict::Ambiguous => "AMBIGUOUS",
        })
    }
}

/// Interpretation evaluated by one branch.
///
/// A `None` rounding means both conventions produced the same candidates, so
/// no tie point was reachable and a single branch covers both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchLabel {
    /// Rounding assumed for the mean.
    pub mean_rounding: Option<RoundingConvention>,
    /// Rounding assumed for the SD.
    pub sd_rounding: Option<RoundingConvention>,
    /// Variance denominator assumed; `None` for mean-only branches.
    pub denominator: Option<VarianceDenominator>,
}

impl fmt::Display for BranchLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounding = |value: Option<RoundingConvention>| value.map_or("any", |r| r.label());
        write!(f, "mean {}", rounding(self.mean_rounding))?;
        if let Some(denominator) = self.denominator {
            write!(f, ", sd {}, denominator {denominator}", rounding(self.sd_rounding))?;
        }
        Ok(())
    }
}

/// Outcome of one interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchOutcome {
    /// Interpretation evaluated.
    pub label: BranchLabel,
    /// Branch-level verdict.
    pub verdict: ConsistencyVerdict,
    /// Ordered explanations.
    pub reasons: Vec<String>,
    /// Integer sums reproducing the mean, when GRIM passed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_sums: Option<CandidateSums>,
}

/// A candidate sum justifying a consistent branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEvidence {
    /// Integer sum of all responses.
    pub sum: i128,
    /// Exact mean implied by the sum.
    pub mean: String,
    /// Attainable sum of squares of subject scores, when an SD was audited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum_of_squares: Option<i128>,
    /// Data set attaining it, when found by exact search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness: Option<Witness>,
    /// Whether the evidence is proven rather than accepted on bounds.
    pub exact: bool,
    /// Interpretation the evidence belongs to.
    pub branch: BranchLabel,
}

/// Structured, explainable result of [`check_consistency`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictRecord {
    /// Final verdict.
    pub verdict: ConsistencyVerdict,
    /// Ordered human-readable reasons.
    pub reasons: Vec<String>,
    /// Candidate sums justifying a consistent verdict.
    pub candidates: Vec<CandidateEvidence>,
    /// Per-interpretation outcomes.
    pub branches: Vec<BranchOutcome>,
    /// Audited statistic.
    pub input: ReportedStatistic,
    /// Options in force.
    pub opts: AuditOpts,
    /// Content hash of everything above.
    pub analysis_hash: String,
}

impl VerdictRecord {
    fn new(
        verdict: ConsistencyVerdict,
        reasons: Vec<String>,
        candidates: Vec<CandidateEvidence>,
        branches: Vec<BranchOutcome>,
        input: &ReportedStatistic,
        opts: &AuditOpts,
    ) -> Result<Self, GrimError> {
        let analysis_hash =
            stable_hash_string(&(&verdict, &reasons, &candidates, &branches, input, opts))?;
        Ok(Self {
            verdict,
            reasons,
            candidates,
            branches,
            input: input.clone(),
            opts: opts.clone(),
            analysis_hash,
        })
    }

    /// Returns true for a consistent verdict.
    pub fn is_consistent(&self) -> bool {
        self.verdict == ConsistencyVerdict::Consistent
    }

    /// Canonical JSON encoding of the record.
    pub fn to_bytes(&self) -> Result<Vec<u8>, GrimError> {
        to_canonical_json_bytes(self)
    }
}

fn check_precision(decimals: u32, field: &str, opts: &AuditOpts) -> Result<(), GrimError> {
    if decimals > opts.max_decimals {
        return Err(GrimError::InvalidInput(
            ErrorInfo::new("precision-too-high", "reported precision exceeds the configured cap")
                .with_context("field", field)
                .with_context("decimals", decimals.to_string())
                .with_context("max_decimals", opts.max_decimals.to_string()),
        ));
    }
    Ok(())
}

struct Audit<'a> {
    stat: &'a ReportedStatistic,
    opts: &'a AuditOpts,
    divisor: u64,
    mean_decimals: u32,
    bounds: ValueBounds,
    branches: Vec<BranchOutcome>,
    evidence: Vec<CandidateEvidence>,
}

impl Audit<'_> {
    fn push(&mut self, outcome: BranchOutcome) {
        tracing::debug!(
            branch = %outcome.label,
            verdict = %outcome.verdict,
            "branch evaluated"
        );
        self.branches.push(outcome);
    }

    fn add_evidence(&mut self, evidence: CandidateEvidence) {
        if self.evidence.len() < self.opts.candidate_listing_limit {
            self.evidence.push(evidence);
        }
    }

    fn render_mean(&self, candidates: &CandidateSums, sum: i128) -> Result<String, GrimError> {
        Ok(candidates
            .mean_of(sum)?
            .to_decimal_string(self.mean_decimals + 4))
    }

    fn mean_only(&mut self, label: BranchLabel, candidates: CandidateSums) -> Result<(), GrimError> {
        let listed: Vec<i128> = if candidates.count() as u128 <= self.opts.candidate_listing_limit as u128 {
            candidates.iter().collect()
        } else {
            vec![candidates.first, candidates.last]
        };
        for sum in listed {
            let mean = self.render_mean(&candidates, sum)?;
            self.add_evidence(CandidateEvidence {
                sum,
                mean,
                sum_of_squares: None,
                witness: None,
                exact: true,
                branch: label,
            });
        }
        self.push(BranchOutcome {
            label,
            verdict: ConsistencyVerdict::Consistent,
            reasons: vec![format!(
                "integer sums {}..={} of {} observations reproduce the mean",
                candidates.first, candidates.last, candidates.divisor
            )],
            candidate_sums: Some(candidates),
        });
        Ok(())
    }

    fn with_sd(
        &mut self,
        mean_rounding: Option<RoundingConvention>,
        candidates: CandidateSums,
        sd_pair: &BracketPair,
    ) -> Result<(), GrimError> {
        let items = i128::from(self.stat.items);
        let up = sd_pair.half_up.interval().scaled(items)?;
        let down = sd_pair.half_down.interval().scaled(items)?;

        for denominator in self.stat.variance_denominator.conventions(self.stat.n) {
            if candidates.count() as u128 > u128::from(self.opts.max_candidate_sums) {
                self.push(BranchOutcome {
                    label: BranchLabel {
                        mean_rounding,
                        sd_rounding: None,
                        denominator: Some(denominator),
                    },
                    verdict: ConsistencyVerdict::Ambiguous,
                    reasons: vec![format!(
                        "{} candidate sums exceed the audit cap of {}",
                        candidates.count(),
                        self.opts.max_candidate_sums
                    )],
                    candidate_sums: Some(candidates),
                });
                continue;
            }

            let mut tie = false;
            for sum in candidates.iter() {
                if integer_window(self.stat.n, sum, denominator, &up)?
                    != integer_window(self.stat.n, sum, denominator, &down)?
                {
                    tie = true;
                    break;
                }
            }
            let readings: Vec<(Option<RoundingConvention>, &Interval)> = if tie {
                vec![
                    (Some(RoundingConvention::HalfUp), &up),
                    (Some(RoundingConvention::HalfDown), &down),
                ]
            } else {
                vec![(None, &up)]
            };

            for (sd_rounding, sd) in readings {
                let label = BranchLabel {
                    mean_rounding,
                    sd_rounding,
                    denominator: Some(denominator),
                };
                self.sd_branch(label, candidates, denominator, sd)?;
            }
        }
        Ok(())
    }

    fn sd_branch(
        &mut self,
        label: BranchLabel,
        candidates: CandidateSums,
        denominator: VarianceDenominator,
        sd: &Interval,
    ) -> Result<(), GrimError> {
        let mut failures = Vec::new();
        let mut notes: Vec<String> = Vec::new();
        let mut passed = 0usize;
        for sum in candidates.iter() {
            match grimmer_check(self.stat.n, sum, denominator, sd, self.bounds, self.opts)? {
                GrimmerOutcome::Consistent {
                    sum_of_squares,
                    witness,
                    exact,
                    note,
                } => {
                    passed += 1;
                    let mean = self.render_mean(&candidates, sum)?;
                    self.add_evidence(CandidateEvidence {
                        sum,
                        mean,
                        sum_of_squares: Some(sum_of_squares),
                        witness,
                        exact,
                        branch: label,
                    });
                    if let Some(note) = note {
                        if !notes.contains(&note) {
                            notes.push(note);
                        }
                    }
                }
                GrimmerOutcome::Inconsistent { reason } => failures.push(reason),
            }
        }

        let limit = self.opts.candidate_listing_limit;
        let (verdict, mut reasons) = if passed > 0 {
            let mut reasons = vec![format!(
                "{passed} of {} candidate sums reproduce the SD",
                candidates.count()
            )];
            reasons.extend(notes);
            (ConsistencyVerdict::Consistent, reasons)
        } else {
            (ConsistencyVerdict::GrimmerInconsistent, failures)
        };
        if reasons.len() > limit {
            let hidden = reasons.len() - limit;
            reasons.truncate(limit);
            reasons.push(format!("... and {hidden} more"));
        }
        self.push(BranchOutcome {
            label,
            verdict,
            reasons,
            candidate_sums: Some(candidates),
        });
        Ok(())
    }
}

fn ambiguous(
    stat: &ReportedStatistic,
    opts: &AuditOpts,
    reason: &str,
) -> Result<VerdictRecord, GrimError> {
    VerdictRecord::new(
        ConsistencyVerdict::Ambiguous,
        vec![reason.to_string()],
        Vec::new(),
        Vec::new(),
        stat,
        opts,
    )
}

fn mean_readings(
    pair: &BracketPair,
    divisor: u64,
    stat: &ReportedStatistic,
) -> Result<Vec<(Option<RoundingConvention>, GrimOutcome)>, GrimError> {
    let up = grim_check(divisor, &pair.half_up, &stat.scale)?;
    let down = grim_check(divisor, &pair.half_down, &stat.scale)?;
    let same = match (&up, &down) {
        (GrimOutcome::Consistent(a), GrimOutcome::Consistent(b)) => a == b,
        (GrimOutcome::Inconsistent { .. }, GrimOutcome::Inconsistent { .. }) => true,
        _ => false,
    };
    Ok(if same {
        vec![(None, up)]
    } else {
        vec![
            (Some(RoundingConvention::HalfUp), up),
            (Some(RoundingConvention::HalfDown), down),
        ]
    })
}

/// Audits one reported statistic.
///
/// Every combination of mean rounding, SD rounding and variance denominator
/// that the inputs leave open is evaluated; the verdict is CONSISTENT as soon
/// as one combination is. Invalid inputs are errors, never verdicts.
pub fn check_consistency(
    stat: &ReportedStatistic,
    opts: &AuditOpts,
) -> Result<VerdictRecord, GrimError> {
    opts.validate()?;
    stat.validate()?;

    let Some(mean_decimals) = stat.mean_precision() else {
        return ambiguous(
            stat,
            opts,
            "mean precision is unknown: the display shows no decimals and none were stated",
        );
    };
    check_precision(mean_decimals, "mean", opts)?;
    let sd_pair = match &stat.sd_display {
        Some(sd) => {
            let Some(sd_decimals) = stat.sd_precision() else {
                return ambiguous(
                    stat,
                    opts,
                    "SD precision is unknown: the display shows no decimals and none were stated",
                );
            };
            check_precision(sd_decimals, "sd", opts)?;
            Some(build_brackets(sd, sd_decimals)?)
        }
        None => None,
    };

    let divisor = stat
        .n
        .checked_mul(u64::from(stat.items))
        .ok_or_else(|| GrimError::overflow("n-times-items"))?;
    let mean_pair = build_brackets(&stat.mean_display, mean_decimals)?;

    let mut audit = Audit {
        stat,
        opts,
        divisor,
        mean_decimals,
        bounds: ValueBounds::from_scale(&stat.scale, stat.items)?,
        branches: Vec::new(),
        evidence: Vec::new(),
    };

    for (mean_rounding, outcome) in mean_readings(&mean_pair, divisor, stat)? {
        match outcome {
            GrimOutcome::Inconsistent { reason } => audit.push(BranchOutcome {
                label: BranchLabel {
                    mean_rounding,
                    sd_rounding: None,
                    denominator: None,
                },
                verdict: ConsistencyVerdict::GrimInconsistent,
                reasons: vec![reason],
                candidate_sums: None,
            }),
            GrimOutcome::Consistent(candidates) => match &sd_pair {
                None => audit.mean_only(
                    BranchLabel {
                        mean_rounding,
                        sd_rounding: None,
                        denominator: None,
                    },
                    candidates,
                )?,
                Some(pair) => audit.with_sd(mean_rounding, candidates, pair)?,
            },
        }
    }

    let verdict = aggregate(&audit.branches);
    let mut reasons = Vec::new();
    if verdict == ConsistencyVerdict::Consistent {
        let accepted: Vec<String> = audit
            .branches
            .iter()
            .filter(|branch| branch.verdict == ConsistencyVerdict::Consistent)
            .map(|branch| branch.label.to_string())
            .collect();
        reasons.push(format!("consistent under: {}", accepted.join("; ")));
        for branch in &audit.branches {
            if branch.verdict == ConsistencyVerdict::Consistent {
                for reason in branch.reasons.iter().skip(1) {
                    if !reasons.contains(reason) {
                        reasons.push(reason.clone());
                    }
                }
            }
        }
    } else {
        for branch in &audit.branches {
            for reason in &branch.reasons {
                reasons.push(format!("{}: {reason}", branch.label));
            }
        }
    }
    if !grim_is_informative(audit.divisor, mean_decimals) {
        reasons.push(format!(
            "GRIM is uninformative at this precision: {} observations resolve means finer than 10^-{mean_decimals}",
            audit.divisor
        ));
    }

    VerdictRecord::new(
        verdict,
        reasons,
        audit.evidence,
        audit.branches,
        stat,
        opts,
    )
}

/// Combines branch verdicts: any consistent branch wins; GRIM failure is only
/// reported when every branch failed GRIM.
pub fn aggregate(branches: &[BranchOutcome]) -> ConsistencyVerdict {
    let any = |verdict: ConsistencyVerdict| branches.iter().any(|branch| branch.verdict == verdict);
    if any(ConsistencyVerdict::Consistent) {
        ConsistencyVerdict::Consistent
    } else if branches.is_empty() || any(ConsistencyVerdict::Ambiguous) {
        ConsistencyVerdict::Ambiguous
    } else if branches
        .iter()
        .all(|branch| branch.verdict == ConsistencyVerdict::GrimInconsistent)
    {
        ConsistencyVerdict::GrimInconsistent
    } else {
        ConsistencyVerdict::GrimmerInconsistent
    }
}
