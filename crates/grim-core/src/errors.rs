//! Structured error types shared across the audit crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`GrimError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (offending field, value, bound, ...).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the audit engine.
///
/// An arithmetic inconsistency is never an error: it is reported through the
/// verdict. Errors are reserved for inputs that cannot be audited at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum GrimError {
    /// Malformed or out-of-range reported statistic.
    #[error("invalid input: {0}")]
    InvalidInput(ErrorInfo),
    /// Malformed audit options.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl GrimError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            GrimError::InvalidInput(info) | GrimError::Config(info) | GrimError::Serde(info) => {
                info
            }
        }
    }

    /// Shorthand for an [`GrimError::InvalidInput`] with code and message.
    pub fn invalid(code: &str, message: impl Into<String>) -> Self {
        GrimError::InvalidInput(ErrorInfo::new(code, message.into()))
    }

    /// Error raised when exact arithmetic leaves the supported integer range.
    pub fn overflow(operation: &str) -> Self {
        GrimError::InvalidInput(
            ErrorInfo::new(
                "magnitude-overflow",
                "reported values are too large for exact arithmetic",
            )
            .with_context("operation", operation),
        )
    }

    /// Returns true when the error is a caller input error.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, GrimError::InvalidInput(_))
    }
}
