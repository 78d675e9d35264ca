//! The reported-statistic data model and its validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::decimal::DecimalDisplay;
use crate::errors::{ErrorInfo, GrimError};
use crate::ratio::Ratio;

/// Variance denominator convention used by the paper.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum VarianceDenominator {
    /// Population variance, divided by `n`.
    Population,
    /// Sample variance, divided by `n - 1`.
    Sample,
    /// Not stated; both conventions are evaluated.
    #[default]
    Unspecified,
}

impl VarianceDenominator {
    /// Concrete conventions to evaluate for a sample of size `n`.
    ///
    /// The sample convention is dropped for `n = 1`, where it is undefined.
    pub fn conventions(self, n: u64) -> Vec<VarianceDenominator> {
        match self {
            VarianceDenominator::Population => vec![VarianceDenominator::Population],
            VarianceDenominator::Sample => vec![VarianceDenominator::Sample],
            VarianceDenominator::Unspecified if n > 1 => {
                vec![VarianceDenominator::Population, VarianceDenominator::Sample]
            }
            VarianceDenominator::Unspecified => vec![VarianceDenominator::Population],
        }
    }

    /// Divisor applied to the sum of squared deviations, if concrete.
    pub fn divisor(self, n: u64) -> Option<u64> {
        match self {
            VarianceDenominator::Population => Some(n),
            VarianceDenominator::Sample => n.checked_sub(1).filter(|value| *value > 0),
            VarianceDenominator::Unspecified => None,
        }
    }

    /// Short label used in reasons and reports.
    pub fn label(self) -> &'static str {
        match self {
            VarianceDenominator::Population => "n",
            VarianceDenominator::Sample => "n-1",
            VarianceDenominator::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for VarianceDenominator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VarianceDenominator {
    type Err = GrimError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "n" | "population" => Ok(VarianceDenominator::Population),
            "n-1" | "sample" => Ok(VarianceDenominator::Sample),
            "" | "unspecified" => Ok(VarianceDenominator::Unspecified),
            other => Err(GrimError::InvalidInput(
                ErrorInfo::new("unknown-denominator", "unrecognised variance denominator")
                    .with_context("value", other)
                    .with_hint("use population, sample or unspecified"),
            )),
        }
    }
}

/// Inclusive bounds of the measurement instrument. `None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScaleBounds {
    /// Smallest value a single response can take.
    #[serde(default = "ScaleBounds::default_min")]
    pub min: Option<i64>,
    /// Largest value a single response can take.
    #[serde(default)]
    pub max: Option<i64>,
}

impl ScaleBounds {
    const fn default_min() -> Option<i64> {
        Some(0)
    }

    /// Bounds with both ends given.
    pub const fn new(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// No bounds at all.
    pub const fn unbounded() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// Returns true when both bounds are given.
    pub fn is_closed(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }
}

impl Default for ScaleBounds {
    fn default() -> Self {
        Self {
            min: Self::default_min(),
            max: None,
        }
    }
}

fn default_items() -> u32 {
    1
}

/// One reported summary statistic under audit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportedStatistic {
    /// Sample size.
    pub n: u64,
    /// Precision of the mean display. Inferred from the display when absent.
    #[serde(default)]
    pub decimals: Option<u32>,
    /// Mean exactly as printed.
    pub mean_display: String,
    /// Standard deviation exactly as printed.
    #[serde(default)]
    pub sd_display: Option<String>,
    /// Precision of the SD display when it differs from the mean's.
    #[serde(default)]
    pub sd_decimals: Option<u32>,
    /// Instrument bounds for a single response.
    #[serde(default)]
    pub scale: ScaleBounds,
    /// Number of integer items averaged into each subject's score.
    #[serde(default = "default_items")]
    pub items: u32,
    /// Variance denominator convention.
    #[serde(default)]
    pub variance_denominator: VarianceDenominator,
    /// Free-form label carried into reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ReportedStatistic {
    /// Creates a mean-only statistic with default scale and conventions.
    pub fn new(n: u64, mean_display: impl Into<String>) -> Self {
        Self {
            n,
            decimals: None,
            mean_display: mean_display.into(),
            sd_display: None,
            sd_decimals: None,
            scale: ScaleBounds::default(),
            items: default_items(),
            variance_denominator: VarianceDenominator::Unspecified,
            label: None,
        }
    }

    /// Sets the reported precision.
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// Sets the reported standard deviation.
    pub fn with_sd(mut self, sd_display: impl Into<String>) -> Self {
        self.sd_display = Some(sd_display.into());
        self
    }

    /// Sets a separate SD precision.
    pub fn with_sd_decimals(mut self, decimals: u32) -> Self {
        self.sd_decimals = Some(decimals);
        self
    }

    /// Sets closed instrument bounds.
    pub fn with_scale(mut self, min: i64, max: i64) -> Self {
        self.scale = ScaleBounds::new(min, max);
        self
    }

    /// Sets arbitrary instrument bounds.
    pub fn with_scale_bounds(mut self, scale: ScaleBounds) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the number of items per subject score.
    pub fn with_items(mut self, items: u32) -> Self {
        self.items = items;
        self
    }

    /// Sets the variance denominator convention.
    pub fn with_denominator(mut self, denominator: VarianceDenominator) -> Self {
        self.variance_denominator = denominator;
        self
    }

    /// Attaches a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Precision of the mean, or `None` when it cannot be determined.
    pub fn mean_precision(&self) -> Option<u32> {
        self.decimals.or_else(|| {
            let shown = DecimalDisplay::shown_decimals(&self.mean_display);
            (shown > 0).then_some(shown)
        })
    }

    /// Precision of the SD, or `None` when it cannot be determined.
    pub fn sd_precision(&self) -> Option<u32> {
        let display = self.sd_display.as_deref()?;
        self.sd_decimals.or(self.decimals).or_else(|| {
            let shown = DecimalDisplay::shown_decimals(display);
            (shown > 0).then_some(shown)
        })
    }

    /// Checks the caller-error conditions. Arithmetic consistency is not
    /// checked here.
    pub fn validate(&self) -> Result<(), GrimError> {
        if self.n == 0 {
            return Err(GrimError::InvalidInput(
                ErrorInfo::new("non-positive-n", "sample size must be positive")
                    .with_context("n", "0"),
            ));
        }
        if self.items == 0 {
            return Err(GrimError::invalid(
                "zero-items",
                "each subject score must average at least one item",
            ));
        }
        if let (Some(min), Some(max)) = (self.scale.min, self.scale.max) {
            if min > max {
                return Err(GrimError::InvalidInput(
                    ErrorInfo::new("inverted-scale", "scale minimum exceeds scale maximum")
                        .with_context("scale_min", min.to_string())
                        .with_context("scale_max", max.to_string()),
                ));
            }
        }
        if let Some(sd) = &self.sd_display {
            if sd.trim().starts_with('-') {
                return Err(GrimError::InvalidInput(
                    ErrorInfo::new("negative-sd", "standard deviation must be non-negative")
                        .with_context("sd", sd.trim()),
                ));
            }
            if self.variance_denominator == VarianceDenominator::Sample && self.n == 1 {
                return Err(GrimError::InvalidInput(
                    ErrorInfo::new(
                        "sample-sd-undefined",
                        "sample standard deviation is undefined for a single observation",
                    )
                    .with_hint("use the population convention or drop the SD"),
                ));
            }
            DecimalDisplay::parse(sd, self.sd_precision())?;
        }

        let mean = DecimalDisplay::parse(&self.mean_display, self.decimals)?.to_ratio()?;
        if let Some(min) = self.scale.min {
            if mean < Ratio::from_integer(i128::from(min)) {
                return Err(out_of_scale(&self.mean_display, "scale_min", min));
            }
        }
        if let Some(max) = self.scale.max {
            if mean > Ratio::from_integer(i128::from(max)) {
                return Err(out_of_scale(&self.mean_display, "scale_max", max));
            }
        }
        Ok(())
    }
}

fn out_of_scale(display: &str, bound: &str, value: i64) -> GrimError {
    GrimError::InvalidInput(
        ErrorInfo::new("mean-outside-scale", "reported mean lies outside the instrument scale")
            .with_context("mean", display.trim())
            .with_context(bound, value.to_string()),
    )
}
