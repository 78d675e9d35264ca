//! Exact parsing of rounded decimal displays such as `"3.44"`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, GrimError};
use crate::ratio::Ratio;

fn display_error(code: &str, message: impl Into<String>, text: &str) -> GrimError {
    GrimError::InvalidInput(ErrorInfo::new(code, message.into()).with_context("display", text))
}

/// Returns `10^exp` as an `i128`.
pub fn pow10(exp: u32) -> Result<i128, GrimError> {
    10i128
        .checked_pow(exp)
        .ok_or_else(|| GrimError::overflow("pow10"))
}

/// A non-negative decimal as displayed: `units / 10^scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecimalDisplay {
    units: i128,
    scale: u32,
}

impl DecimalDisplay {
    /// Parses `text` at the stated precision.
    ///
    /// With `decimals = None` the precision is the number of fractional
    /// digits shown. A display showing fewer digits than `decimals` is padded
    /// (`"3.5"` at two decimals is `3.50`); showing more is an error.
    pub fn parse(text: &str, decimals: Option<u32>) -> Result<Self, GrimError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(display_error("empty-display", "reported value is empty", text));
        }
        if trimmed.starts_with('-') {
            return Err(display_error(
                "negative-display",
                "reported value must be non-negative",
                text,
            ));
        }
        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };
        let digits_only = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !digits_only(whole) || !digits_only(fraction)
        {
            return Err(display_error(
                "malformed-display",
                "reported value is not a plain decimal number",
                text,
            ));
        }
        let shown = u32::try_from(fraction.len()).map_err(|_| GrimError::overflow("decimal-digits"))?;
        let scale = decimals.unwrap_or(shown);
        if shown > scale {
            return Err(GrimError::InvalidInput(
                ErrorInfo::new(
                    "excess-precision",
                    "reported value shows more fractional digits than the stated precision",
                )
                .with_context("display", text)
                .with_context("decimals", scale.to_string())
                .with_hint("pass the precision actually used in the paper"),
            ));
        }

        let mut units: i128 = 0;
        for byte in whole.bytes().chain(fraction.bytes()) {
            units = units
                .checked_mul(10)
                .and_then(|value| value.checked_add(i128::from(byte - b'0')))
                .ok_or_else(|| GrimError::overflow("decimal-parse"))?;
        }
        units = units
            .checked_mul(pow10(scale - shown)?)
            .ok_or_else(|| GrimError::overflow("decimal-pad"))?;
        Ok(Self { units, scale })
    }

    /// Number of fractional digits shown in `text` (no validation).
    pub fn shown_decimals(text: &str) -> u32 {
        text.trim()
            .split_once('.')
            .map(|(_, fraction)| fraction.len() as u32)
            .unwrap_or(0)
    }

    /// Integer count of `10^-scale` units.
    pub fn units(&self) -> i128 {
        self.units
    }

    /// Precision of the display.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Exact value as a rational.
    pub fn to_ratio(&self) -> Result<Ratio, GrimError> {
        Ratio::new(self.units, pow10(self.scale)?)
    }
}

impl fmt::Display for DecimalDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_ratio() {
            Ok(value) => write!(f, "{}", value.to_decimal_string(self.scale)),
            Err(_) => write!(f, "{}e-{}", self.units, self.scale),
        }
    }
}
