//! GRIMMER Engine: standard-deviation consistency for one candidate sum.

use grim_core::{GrimError, Ratio, VarianceDenominator};
use serde::{Deserialize, Serialize};

use crate::bracket::Interval;
use crate::envelope::{envelope, ValueBounds};
use crate::opts::AuditOpts;
use crate::search::{search_attainable, SearchOutcome, Witness};

/// Result of checking one candidate sum under one variance convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GrimmerOutcome {
    /// Some integer data set reproduces the SD.
    Consistent {
        /// An attainable sum of squares inside the implied window.
        sum_of_squares: i128,
        /// Data set attaining it, when found by exact search.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        witness: Option<Witness>,
        /// Whether attainability was proven rather than accepted on bounds.
        exact: bool,
        /// Why attainability was accepted on bounds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    /// No integer data set reproduces the SD.
    Inconsistent {
        /// Human readable explanation naming the gap.
        reason: String,
    },
}

impl GrimmerOutcome {
    /// Returns true for [`GrimmerOutcome::Consistent`].
    pub fn is_consistent(&self) -> bool {
        matches!(self, GrimmerOutcome::Consistent { .. })
    }
}

/// Exact interval of sums of squares implied by an SD interval.
///
/// `SS = sd^2 * d + sum^2 / n` with `d` the variance divisor. The map is
/// increasing for `sd >= 0`, so endpoints and their inclusion carry over.
pub fn implied_sum_of_squares(
    n: u64,
    sum: i128,
    divisor: u64,
    sd: &Interval,
) -> Result<Interval, GrimError> {
    let mean_part = Ratio::new(
        sum.checked_mul(sum)
            .ok_or_else(|| GrimError::overflow("sum-squared"))?,
        i128::from(n),
    )?;
    let map = |bound: Ratio| -> Result<Ratio, GrimError> {
        bound
            .checked_mul(&bound)?
            .checked_mul_int(i128::from(divisor))?
            .checked_add(&mean_part)
    };
    Ok(Interval::new(
        map(sd.low())?,
        map(sd.high())?,
        sd.low_closed(),
        sd.high_closed(),
    ))
}

/// Integer sums of squares implied by an SD interval, if any.
pub fn integer_window(
    n: u64,
    sum: i128,
    denominator: VarianceDenominator,
    sd: &Interval,
) -> Result<Option<(i128, i128)>, GrimError> {
    let Some(divisor) = denominator.divisor(n) else {
        return Ok(None);
    };
    Ok(implied_sum_of_squares(n, sum, divisor, sd)?.integer_range())
}

fn parity_name(sum: i128) -> &'static str {
    if sum.rem_euclid(2) == 0 {
        "even"
    } else {
        "odd"
    }
}

/// Checks whether `n` integers within `bounds` summing to `sum` can have a
/// standard deviation inside `sd` under `denominator`.
///
/// `sd` must be expressed in the same units as `bounds` (subject totals when
/// several items are averaged).
pub fn grimmer_check(
    n: u64,
    sum: i128,
    denominator: VarianceDenominator,
    sd: &Interval,
    bounds: ValueBounds,
    opts: &AuditOpts,
) -> Result<GrimmerOutcome, GrimError> {
    let Some(divisor) = denominator.divisor(n) else {
        return Err(GrimError::invalid(
            "undefined-denominator",
            format!("variance denominator {denominator} is undefined for n = {n}"),
        ));
    };
    let implied = implied_sum_of_squares(n, sum, divisor, sd)?;
    let window = implied.render(4);
    let Some((low, high)) = implied.integer_range() else {
        return Ok(GrimmerOutcome::Inconsistent {
            reason: format!("sum {sum}: implied sum of squares {window} contains no integer"),
        });
    };

    let Some(reach) = envelope(n, sum, bounds)? else {
        return Ok(GrimmerOutcome::Inconsistent {
            reason: format!("sum {sum}: no {n} admissible values add up to it"),
        });
    };
    let Some((low, high)) = reach.clip(low, high) else {
        return Ok(GrimmerOutcome::Inconsistent {
            reason: format!(
                "sum {sum}: implied sum of squares {window} lies outside the reachable envelope {}",
                reach.render()
            ),
        });
    };

    // x^2 and x share parity, so the sum of squares shares the sum's parity.
    let low = low + (low - sum).rem_euclid(2);
    if low > high {
        return Ok(GrimmerOutcome::Inconsistent {
            reason: format!(
                "sum {sum}: every integer sum of squares in {window} is {} but it must be {}",
                parity_name(sum + 1),
                parity_name(sum)
            ),
        });
    }

    if n > opts.exact_threshold {
        return Ok(GrimmerOutcome::Consistent {
            sum_of_squares: low,
            witness: None,
            exact: false,
            note: Some(format!(
                "n = {n} exceeds the exact-search threshold; accepted on envelope and parity overlap"
            )),
        });
    }

    match search_attainable(n, sum, bounds, low, high, opts.search_budget)? {
        SearchOutcome::Found(witness) => Ok(GrimmerOutcome::Consistent {
            sum_of_squares: witness.sum_of_squares,
            witness: Some(witness),
            exact: true,
            note: None,
        }),
        SearchOutcome::Unattainable => Ok(GrimmerOutcome::Inconsistent {
            reason: format!(
                "sum {sum}: no integer data set attains a sum of squares in [{low}, {high}] (envelope {})",
                reach.render()
            ),
        }),
        SearchOutcome::BudgetExhausted { visited } => {
            tracing::debug!(sum, visited, "attainability search budget exhausted");
            Ok(GrimmerOutcome::Consistent {
                sum_of_squares: low,
                witness: None,
                exact: false,
                note: Some(format!(
                    "search budget exhausted after {visited} nodes; accepted on envelope and parity overlap"
                )),
            })
        }
    }
}
