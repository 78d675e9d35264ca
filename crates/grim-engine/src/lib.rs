#![deny(missing_docs)]
#![doc = "GRIM/GRIMMER consistency checks: rounding brackets, integer-sum candidates, sum-of-squares reachability and the verdict aggregator."]

pub mod batch;
pub mod bracket;
pub mod envelope;
pub mod grim;
pub mod grimmer;
/// Audit options.
pub mod opts;
pub mod search;
pub mod verdict;

pub use batch::{check_batch, run_batch, BatchEntry, BatchOutcome, BatchReport};
pub use bracket::{build_brackets, Bracket, BracketPair, Interval, RoundingConvention};
pub use envelope::{envelope, ReachabilityEnvelope, ValueBounds};
pub use grim::{grim_candidates, grim_check, grim_is_informative, CandidateSums, GrimOutcome};
pub use grimmer::{grimmer_check, implied_sum_of_squares, integer_window, GrimmerOutcome};
pub use opts::AuditOpts;
pub use search::{search_attainable, SearchOutcome, Witness, WitnessEntry};
pub use verdict::{
    aggregate, check_consistency, BranchLabel, BranchOutcome, CandidateEvidence,
    ConsistencyVerdict, VerdictRecord,
};
