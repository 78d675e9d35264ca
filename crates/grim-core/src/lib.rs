#![deny(missing_docs)]
#![doc = "Core vocabulary for GRIM/GRIMMER audits: the reported-statistic model, exact decimal and rational arithmetic, and the shared error taxonomy."]

/// Exact parsing of rounded decimal displays.
pub mod decimal;
pub mod errors;
/// Content hashing helpers.
pub mod hash;
pub mod ratio;
/// Canonical JSON helpers.
pub mod serde;
/// Reported statistics and their validation.
pub mod statistic;

pub use decimal::{pow10, DecimalDisplay};
pub use errors::{ErrorInfo, GrimError};
pub use hash::stable_hash_string;
pub use ratio::Ratio;
pub use self::serde::{from_json_slice, to_canonical_json_bytes};
pub use statistic::{ReportedStatistic, ScaleBounds, VarianceDenominator};
