//! Bracket Builder: true-value intervals consistent with a rounded display.

use std::fmt;

use grim_core::{pow10, DecimalDisplay, GrimError, Ratio};
use serde::{Deserialize, Serialize};

/// Direction assumed for a true value sitting exactly on a rounding tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingConvention {
    /// Ties round up: the bracket is `[v - h, v + h)`.
    HalfUp,
    /// Ties round down: the bracket is `(v - h, v + h]`.
    HalfDown,
}

impl RoundingConvention {
    /// Both conventions, half-up first.
    pub const BOTH: [RoundingConvention; 2] =
        [RoundingConvention::HalfUp, RoundingConvention::HalfDown];

    /// Short label used in reasons.
    pub fn label(self) -> &'static str {
        match self {
            RoundingConvention::HalfUp => "half-up",
            RoundingConvention::HalfDown => "half-down",
        }
    }
}

/// Real interval with exact endpoints and explicit endpoint inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    low: Ratio,
    high: Ratio,
    low_closed: bool,
    high_closed: bool,
}

impl Interval {
    /// Builds an interval; `low` must not exceed `high`.
    pub fn new(low: Ratio, high: Ratio, low_closed: bool, high_closed: bool) -> Self {
        debug_assert!(low <= high);
        Self {
            low,
            high,
            low_closed,
            high_closed,
        }
    }

    /// Lower endpoint.
    pub fn low(&self) -> Ratio {
        self.low
    }

    /// Upper endpoint.
    pub fn high(&self) -> Ratio {
        self.high
    }

    /// Whether the lower endpoint belongs to the interval.
    pub fn low_closed(&self) -> bool {
        self.low_closed
    }

    /// Whether the upper endpoint belongs to the interval.
    pub fn high_closed(&self) -> bool {
        self.high_closed
    }

    /// Membership test honouring endpoint inclusion.
    pub fn contains(&self, value: &Ratio) -> bool {
        let above = if self.low_closed {
            *value >= self.low
        } else {
            *value > self.low
        };
        let below = if self.high_closed {
            *value <= self.high
        } else {
            *value < self.high
        };
        above && below
    }

    /// Smallest and largest integers inside the interval, if any.
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        let first = if self.low_closed {
            self.low.ceil()
        } else {
            self.low.floor() + 1
        };
        let last = if self.high_closed {
            self.high.floor()
        } else {
            self.high.ceil() - 1
        };
        (first <= last).then_some((first, last))
    }

    /// Multiplies both endpoints by a positive integer.
    pub fn scaled(&self, factor: i128) -> Result<Interval, GrimError> {
        debug_assert!(factor > 0);
        Ok(Interval {
            low: self.low.checked_mul_int(factor)?,
            high: self.high.checked_mul_int(factor)?,
            ..*self
        })
    }

    /// Renders the interval with `places` fractional digits.
    pub fn render(&self, places: u32) -> String {
        format!(
            "{}{}, {}{}",
            if self.low_closed { '[' } else { '(' },
            self.low.to_decimal_string(places),
            self.high.to_decimal_string(places),
            if self.high_closed { ']' } else { ')' },
        )
    }
}

/// Interval of true values that round to a display under one convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    interval: Interval,
    rounding: RoundingConvention,
    decimals: u32,
}

impl Bracket {
    /// Builds the bracket of `display` under `rounding`.
    ///
    /// Quantities audited here are non-negative, so a lower end below zero is
    /// clamped to a closed zero: a display of `0.00` admits exactly 0.
    pub fn around(display: &DecimalDisplay, rounding: RoundingConvention) -> Result<Self, GrimError> {
        let decimals = display.scale();
        let unit = pow10(decimals)?
            .checked_mul(2)
            .ok_or_else(|| GrimError::overflow("bracket-half-width"))?;
        let half = Ratio::new(1, unit)?;
        let value = display.to_ratio()?;
        let (low_closed, high_closed) = match rounding {
            RoundingConvention::HalfUp => (true, false),
            RoundingConvention::HalfDown => (false, true),
        };
        let mut interval = Interval::new(
            value.checked_sub(&half)?,
            value.checked_add(&half)?,
            low_closed,
            high_closed,
        );
        if interval.low < Ratio::ZERO {
            interval.low = Ratio::ZERO;
            interval.low_closed = true;
        }
        Ok(Self {
            interval,
            rounding,
            decimals,
        })
    }

    /// Underlying interval.
    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Convention the bracket assumes.
    pub fn rounding(&self) -> RoundingConvention {
        self.rounding
    }

    /// Precision of the display the bracket was built from.
    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Returns true when `value` rounds to the display under this convention.
    pub fn contains(&self, value: &Ratio) -> bool {
        self.interval.contains(value)
    }
}

impl fmt::Display for Bracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.interval.render(self.decimals + 1))
    }
}

/// Both readings of one display. They differ only at the tie points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketPair {
    /// Round-half-up reading.
    pub half_up: Bracket,
    /// Round-half-down reading.
    pub half_down: Bracket,
}

impl BracketPair {
    /// Bracket for the given convention.
    pub fn get(&self, rounding: RoundingConvention) -> &Bracket {
        match rounding {
            RoundingConvention::HalfUp => &self.half_up,
            RoundingConvention::HalfDown => &self.half_down,
        }
    }
}

/// Parses `text` at precision `decimals` and builds both brackets.
pub fn build_brackets(text: &str, decimals: u32) -> Result<BracketPair, GrimError> {
    let display = DecimalDisplay::parse(text, Some(decimals))?;
    Ok(BracketPair {
        half_up: Bracket::around(&display, RoundingConvention::HalfUp)?,
        half_down: Bracket::around(&display, RoundingConvention::HalfDown)?,
    })
}
