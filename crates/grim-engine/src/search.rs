//! Exact integer attainability of a sum-of-squares window.
//!
//! Sums of squares of integers are not continuous: an envelope that overlaps
//! the implied window does not prove that some data set lands inside it. The
//! search allocates counts to values from the largest admissible value down,
//! re-deriving the remaining sum and sum of squares at every step and pruning
//! with the reachability envelope of what is left.

use std::collections::HashSet;

use grim_core::GrimError;
use serde::{Deserialize, Serialize};

use crate::envelope::{max_sum_of_squares, min_sum_of_squares, ValueBounds};

/// One value of a witness data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WitnessEntry {
    /// Observation value (subject total when items are averaged).
    pub value: i128,
    /// Number of observations taking the value.
    pub count: u64,
}

/// An integer data set, as a value table, attaining a sum of squares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Witness {
    /// Values in decreasing order with their multiplicities.
    pub entries: Vec<WitnessEntry>,
    /// Sum of squares of the data set.
    pub sum_of_squares: i128,
}

impl Witness {
    /// Number of observations.
    pub fn len(&self) -> u64 {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    /// Returns true when the witness holds no observation.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of the observations.
    pub fn sum(&self) -> i128 {
        self.entries
            .iter()
            .map(|entry| entry.value * i128::from(entry.count))
            .sum()
    }
}

/// Result of one attainability search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A data set attains a sum of squares inside the window.
    Found(Witness),
    /// Every admissible data set was ruled out.
    Unattainable,
    /// The node budget ran out before a decision.
    BudgetExhausted {
        /// Nodes expanded before giving up.
        visited: u64,
    },
}

fn isqrt(value: u128) -> u128 {
    if value < 2 {
        return value;
    }
    let mut x = value;
    let mut y = value / 2 + (value & 1);
    while y < x {
        x = y;
        y = (x + value / x) / 2;
    }
    x
}

fn overflow() -> GrimError {
    GrimError::overflow("attainability-search")
}

struct Frame {
    value: i128,
    remaining: i128,
    sum: i128,
    ss_low: i128,
    ss_high: i128,
    next_count: i128,
    min_count: i128,
    chosen: i128,
}

type StateKey = (i128, i128, i128, i128);

struct Search {
    floor: i128,
    budget: u64,
    visited: u64,
    memo_cap: usize,
    failed: HashSet<StateKey>,
}

impl Search {
    fn viable(
        &self,
        value: i128,
        remaining: i128,
        sum: i128,
        ss_low: i128,
        ss_high: i128,
    ) -> Result<bool, GrimError> {
        if value < self.floor {
            return Ok(false);
        }
        let lowest = remaining.checked_mul(self.floor).ok_or_else(overflow)?;
        let highest = remaining.checked_mul(value).ok_or_else(overflow)?;
        if sum < lowest || sum > highest {
            return Ok(false);
        }
        if min_sum_of_squares(remaining, sum)? > ss_high {
            return Ok(false);
        }
        let bounds = ValueBounds {
            min: Some(self.floor),
            max: Some(value),
        };
        if max_sum_of_squares(remaining, sum, bounds)?.is_some_and(|max| max < ss_low) {
            return Ok(false);
        }
        Ok(!self.failed.contains(&(value, remaining, sum, ss_low)))
    }

    fn frame(&self, value: i128, remaining: i128, sum: i128, ss_low: i128, ss_high: i128) -> Frame {
        let (min_count, max_count) = if value == self.floor {
            (remaining, remaining)
        } else {
            let max = remaining.min((sum - remaining * self.floor) / (value - self.floor));
            let min = (sum - remaining * (value - 1)).max(0);
            (min, max)
        };
        Frame {
            value,
            remaining,
            sum,
            ss_low,
            ss_high,
            next_count: max_count,
            min_count,
            chosen: 0,
        }
    }

    fn run(&mut self, top: i128, n: i128, sum: i128, ss_low: i128, ss_high: i128) -> Result<SearchOutcome, GrimError> {
        if !self.viable(top, n, sum, ss_low, ss_high)? {
            return Ok(SearchOutcome::Unattainable);
        }
        let mut stack = vec![self.frame(top, n, sum, ss_low, ss_high)];
        while let Some(frame) = stack.last_mut() {
            if frame.next_count < frame.min_count {
                let key = (frame.value, frame.remaining, frame.sum, frame.ss_low);
                stack.pop();
                if self.failed.len() < self.memo_cap {
                    self.failed.insert(key);
                }
                continue;
            }
            let count = frame.next_count;
            frame.next_count -= 1;
            frame.chosen = count;

            let value = frame.value;
            let square = value.checked_mul(value).ok_or_else(overflow)?;
            let taken = count.checked_mul(square).ok_or_else(overflow)?;
            let remaining = frame.remaining - count;
            let rest_sum = frame.sum - count * value;
            let rest_low = frame.ss_low.checked_sub(taken).ok_or_else(overflow)?;
            let rest_high = frame.ss_high.checked_sub(taken).ok_or_else(overflow)?;

            if remaining == 0 {
                if rest_sum == 0 && rest_low <= 0 && rest_high >= 0 {
                    return Ok(SearchOutcome::Found(witness(&stack)));
                }
                continue;
            }
            if !self.viable(value - 1, remaining, rest_sum, rest_low, rest_high)? {
                continue;
            }
            self.visited += 1;
            if self.visited > self.budget {
                return Ok(SearchOutcome::BudgetExhausted {
                    visited: self.visited - 1,
                });
            }
            let child = self.frame(value - 1, remaining, rest_sum, rest_low, rest_high);
            stack.push(child);
        }
        Ok(SearchOutcome::Unattainable)
    }
}

fn witness(stack: &[Frame]) -> Witness {
    let entries: Vec<WitnessEntry> = stack
        .iter()
        .filter(|frame| frame.chosen > 0)
        .map(|frame| WitnessEntry {
            value: frame.value,
            count: frame.chosen as u64,
        })
        .collect();
    let sum_of_squares = entries
        .iter()
        .map(|entry| entry.value * entry.value * i128::from(entry.count))
        .sum();
    Witness {
        entries,
        sum_of_squares,
    }
}

/// Decides whether `n` integers within `bounds` summing to `sum` can have a
/// sum of squares in `[ss_low, ss_high]`.
pub fn search_attainable(
    n: u64,
    sum: i128,
    bounds: ValueBounds,
    ss_low: i128,
    ss_high: i128,
    budget: u64,
) -> Result<SearchOutcome, GrimError> {
    let count = i128::from(n);
    if count == 0 || ss_low > ss_high {
        return Ok(SearchOutcome::Unattainable);
    }
    // Every value satisfies (n*x - sum)^2 <= n * (n*ss_high - sum^2).
    let spread = count
        .checked_mul(ss_high)
        .and_then(|value| value.checked_sub(sum.checked_mul(sum)?))
        .ok_or_else(overflow)?;
    if spread < 0 {
        return Ok(SearchOutcome::Unattainable);
    }
    let reach = count
        .checked_mul(spread)
        .map(|value| isqrt(value as u128) as i128)
        .ok_or_else(overflow)?;
    let mut floor = (sum - reach).div_euclid(count) + i128::from((sum - reach).rem_euclid(count) != 0);
    let mut top = (sum + reach).div_euclid(count);
    if let Some(min) = bounds.min {
        floor = floor.max(min);
    }
    if let Some(max) = bounds.max {
        top = top.min(max);
    }
    if floor > top {
        return Ok(SearchOutcome::Unattainable);
    }

    let mut search = Search {
        floor,
        budget,
        visited: 0,
        memo_cap: usize::try_from(budget / 4).unwrap_or(usize::MAX),
        failed: HashSet::new(),
    };
    search.run(top, count, sum, ss_low, ss_high)
}
