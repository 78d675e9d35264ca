//! Reachability envelope: the extreme sums of squares of `n` bounded
//! integers with a fixed sum.

use grim_core::{GrimError, ScaleBounds};
use serde::{Deserialize, Serialize};

fn mul(a: i128, b: i128) -> Result<i128, GrimError> {
    a.checked_mul(b)
        .ok_or_else(|| GrimError::overflow("envelope"))
}

fn add(a: i128, b: i128) -> Result<i128, GrimError> {
    a.checked_add(b)
        .ok_or_else(|| GrimError::overflow("envelope"))
}

fn sub(a: i128, b: i128) -> Result<i128, GrimError> {
    a.checked_sub(b)
        .ok_or_else(|| GrimError::overflow("envelope"))
}

/// Inclusive bounds on a single integer observation. `None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueBounds {
    /// Smallest admissible value.
    pub min: Option<i128>,
    /// Largest admissible value.
    pub max: Option<i128>,
}

impl ValueBounds {
    /// Bounds on a subject total of `items` responses on `scale`.
    pub fn from_scale(scale: &ScaleBounds, items: u32) -> Result<Self, GrimError> {
        let factor = i128::from(items);
        Ok(Self {
            min: scale.min.map(|value| mul(i128::from(value), factor)).transpose()?,
            max: scale.max.map(|value| mul(i128::from(value), factor)).transpose()?,
        })
    }

    /// Returns true when `n` values within the bounds can sum to `sum`.
    pub fn admits_sum(&self, n: i128, sum: i128) -> Result<bool, GrimError> {
        if let Some(min) = self.min {
            if sum < mul(n, min)? {
                return Ok(false);
            }
        }
        if let Some(max) = self.max {
            if sum > mul(n, max)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Interval `[min_ss, max_ss]` of sums of squares over all admissible
/// multisets. `max_ss = None` means the envelope is unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReachabilityEnvelope {
    /// Sum of squares of the most equal allocation.
    pub min_ss: i128,
    /// Sum of squares of the most extreme allocation.
    pub max_ss: Option<i128>,
}

impl ReachabilityEnvelope {
    /// Intersection with the integer window `[low, high]`.
    pub fn clip(&self, low: i128, high: i128) -> Option<(i128, i128)> {
        let low = low.max(self.min_ss);
        let high = match self.max_ss {
            Some(max) => high.min(max),
            None => high,
        };
        (low <= high).then_some((low, high))
    }

    /// Renders the envelope for reasons.
    pub fn render(&self) -> String {
        match self.max_ss {
            Some(max) => format!("[{}, {}]", self.min_ss, max),
            None => format!("[{}, unbounded)", self.min_ss),
        }
    }
}

/// Smallest sum of squares of `n` integers summing to `sum`: the values are
/// as equal as possible, `r` of them `q + 1` and `n - r` of them `q`.
pub fn min_sum_of_squares(n: i128, sum: i128) -> Result<i128, GrimError> {
    let q = sum.div_euclid(n);
    let r = sum.rem_euclid(n);
    let upper = add(q, 1)?;
    add(mul(r, mul(upper, upper)?)?, mul(n - r, mul(q, q)?)?)
}

/// Largest sum of squares of `n` integers within `bounds` summing to `sum`.
///
/// The maximiser of a convex function on the bounded simplex slice is a
/// vertex: every value but one at a bound. With both bounds, as many values
/// as possible sit at the maximum, one absorbs the residue and the rest sit
/// at the minimum. With one bound, `n - 1` values sit on it.
pub fn max_sum_of_squares(
    n: i128,
    sum: i128,
    bounds: ValueBounds,
) -> Result<Option<i128>, GrimError> {
    let value = match (bounds.min, bounds.max) {
        (Some(low), Some(high)) => {
            let span = sub(high, low)?;
            if span == 0 {
                mul(n, mul(low, low)?)?
            } else {
                let excess = sub(sum, mul(n, low)?)?;
                let at_max = excess / span;
                if at_max >= n {
                    mul(n, mul(high, high)?)?
                } else {
                    let middle = add(low, excess % span)?;
                    let rest = n - at_max - 1;
                    add(
                        add(mul(at_max, mul(high, high)?)?, mul(middle, middle)?)?,
                        mul(rest, mul(low, low)?)?,
                    )?
                }
            }
        }
        (Some(bound), None) | (None, Some(bound)) => {
            let others = n - 1;
            let last = sub(sum, mul(others, bound)?)?;
            add(mul(others, mul(bound, bound)?)?, mul(last, last)?)?
        }
        (None, None) => return Ok(None),
    };
    Ok(Some(value))
}

/// Envelope for `n` values within `bounds` summing to `sum`, or `None` when
/// no admissible multiset has that sum.
pub fn envelope(
    n: u64,
    sum: i128,
    bounds: ValueBounds,
) -> Result<Option<ReachabilityEnvelope>, GrimError> {
    let n = i128::from(n);
    if n == 0 || !bounds.admits_sum(n, sum)? {
        return Ok(None);
    }
    Ok(Some(ReachabilityEnvelope {
        min_ss: min_sum_of_squares(n, sum)?,
        max_ss: max_sum_of_squares(n, sum, bounds)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_allocation_minimises() {
        // 62 over 18 values: 8 fours and 10 threes.
        assert_eq!(min_sum_of_squares(18, 62).unwrap(), 8 * 16 + 10 * 9);
        assert_eq!(min_sum_of_squares(4, -6).unwrap(), 2 * 1 + 2 * 4);
    }

    #[test]
    fn extreme_allocation_maximises() {
        let likert = ValueBounds {
            min: Some(1),
            max: Some(5),
        };
        // Excess 44 over span 4: eleven fives and seven ones.
        assert_eq!(max_sum_of_squares(18, 62, likert).unwrap(), Some(11 * 25 + 1 + 6));
        let floor_only = ValueBounds {
            min: Some(0),
            max: None,
        };
        assert_eq!(max_sum_of_squares(3, 7, floor_only).unwrap(), Some(49));
        let unbounded = ValueBounds {
            min: None,
            max: None,
        };
        assert_eq!(max_sum_of_squares(3, 7, unbounded).unwrap(), None);
    }

    #[test]
    fn infeasible_sum_has_no_envelope() {
        let likert = ValueBounds {
            min: Some(1),
            max: Some(5),
        };
        assert_eq!(envelope(3, 16, likert).unwrap(), None);
        assert_eq!(envelope(3, 2, likert).unwrap(), None);
        let full = envelope(3, 15, likert).unwrap().unwrap();
        assert_eq!((full.min_ss, full.max_ss), (75, Some(75)));
    }
}
