//! GRIM Engine: integer sums whose mean lands in a mean bracket.

use std::ops::RangeInclusive;

use grim_core::{pow10, GrimError, Ratio, ScaleBounds};
use serde::{Deserialize, Serialize};

use crate::bracket::Bracket;

/// Contiguous range of integer sums `k` with `k / divisor` inside a bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateSums {
    /// Number of integer responses summed (`n * items`).
    pub divisor: u64,
    /// Smallest admissible sum.
    pub first: i128,
    /// Largest admissible sum.
    pub last: i128,
}

impl CandidateSums {
    /// Number of admissible sums.
    pub fn count(&self) -> i128 {
        self.last - self.first + 1
    }

    /// Iterates the admissible sums in increasing order.
    pub fn iter(&self) -> RangeInclusive<i128> {
        self.first..=self.last
    }

    /// Exact mean implied by `sum`.
    pub fn mean_of(&self, sum: i128) -> Result<Ratio, GrimError> {
        Ratio::new(sum, i128::from(self.divisor))
    }
}

/// Result of the mean-only check for one bracket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrimOutcome {
    /// At least one integer sum reproduces the mean.
    Consistent(CandidateSums),
    /// No integer sum reproduces the mean.
    Inconsistent {
        /// Human readable explanation.
        reason: String,
    },
}

fn bound_total(divisor: i128, bound: Option<i64>) -> Result<Option<i128>, GrimError> {
    bound
        .map(|value| {
            divisor
                .checked_mul(i128::from(value))
                .ok_or_else(|| GrimError::overflow("scale-total"))
        })
        .transpose()
}

/// Integer sums of `divisor` responses on `scale` whose mean lies in `bracket`.
///
/// The half-open semantics of the bracket carry over exactly: for
/// `[low, high)` the range is `ceil(divisor*low) ..= ceil(divisor*high) - 1`.
pub fn grim_candidates(
    divisor: u64,
    bracket: &Bracket,
    scale: &ScaleBounds,
) -> Result<Option<CandidateSums>, GrimError> {
    let total = i128::from(divisor);
    let Some((mut first, mut last)) = bracket.interval().scaled(total)?.integer_range() else {
        return Ok(None);
    };
    if let Some(min) = bound_total(total, scale.min)? {
        first = first.max(min);
    }
    if let Some(max) = bound_total(total, scale.max)? {
        last = last.min(max);
    }
    tracing::trace!(divisor, first, last, bracket = %bracket, "grim candidate range");
    Ok((first <= last).then_some(CandidateSums {
        divisor,
        first,
        last,
    }))
}

/// Mean-only consistency for one bracket.
pub fn grim_check(
    divisor: u64,
    bracket: &Bracket,
    scale: &ScaleBounds,
) -> Result<GrimOutcome, GrimError> {
    Ok(match grim_candidates(divisor, bracket, scale)? {
        Some(candidates) => GrimOutcome::Consistent(candidates),
        None => GrimOutcome::Inconsistent {
            reason: format!(
                "no integer sum of {divisor} observations averages into the reported bracket {bracket}"
            ),
        },
    })
}

/// Returns false when every bracket at this precision necessarily contains a
/// multiple of `1 / divisor`, so GRIM cannot flag anything.
pub fn grim_is_informative(divisor: u64, decimals: u32) -> bool {
    match pow10(decimals) {
        Ok(resolution) => i128::from(divisor) < resolution,
        Err(_) => true,
    }
}
