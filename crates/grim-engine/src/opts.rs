use grim_core::{ErrorInfo, GrimError};
use serde::{Deserialize, Serialize};

fn config_error(code: &str, field: &str, message: &str) -> GrimError {
    GrimError::Config(ErrorInfo::new(code, message).with_context("field", field))
}

/// Options controlling how far an audit goes before settling for bounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AuditOpts {
    /// Largest sample size for which integer attainability is searched exactly.
    #[serde(default = "AuditOpts::default_exact_threshold")]
    pub exact_threshold: u64,
    /// Node budget of one attainability search.
    #[serde(default = "AuditOpts::default_search_budget")]
    pub search_budget: u64,
    /// Largest candidate range listed sum by sum in reasons and evidence.
    #[serde(default = "AuditOpts::default_listing_limit")]
    pub candidate_listing_limit: usize,
    /// Largest candidate range GRIMMER walks before giving up as ambiguous.
    #[serde(default = "AuditOpts::default_max_candidate_sums")]
    pub max_candidate_sums: u64,
    /// Largest accepted display precision.
    #[serde(default = "AuditOpts::default_max_decimals")]
    pub max_decimals: u32,
    /// Worker threads used by batch audits.
    #[serde(default = "AuditOpts::default_concurrency")]
    pub concurrency: usize,
}

impl AuditOpts {
    const fn default_exact_threshold() -> u64 {
        200
    }

    const fn default_search_budget() -> u64 {
        1_000_000
    }

    const fn default_listing_limit() -> usize {
        64
    }

    const fn default_max_candidate_sums() -> u64 {
        100_000
    }

    const fn default_max_decimals() -> u32 {
        8
    }

    const fn default_concurrency() -> usize {
        1
    }

    /// Rejects options that would make an audit meaningless.
    pub fn validate(&self) -> Result<(), GrimError> {
        if self.search_budget == 0 {
            return Err(config_error(
                "zero-search-budget",
                "search_budget",
                "attainability search budget must be positive",
            ));
        }
        if self.candidate_listing_limit == 0 {
            return Err(config_error(
                "zero-listing-limit",
                "candidate_listing_limit",
                "candidate listing limit must be positive",
            ));
        }
        if self.max_candidate_sums == 0 {
            return Err(config_error(
                "zero-candidate-cap",
                "max_candidate_sums",
                "candidate sum cap must be positive",
            ));
        }
        if self.max_decimals > 12 {
            return Err(config_error(
                "excessive-precision-cap",
                "max_decimals",
                "precision above 12 decimals exceeds exact arithmetic range",
            ));
        }
        Ok(())
    }
}

impl Default for AuditOpts {
    fn default() -> Self {
        Self {
            exact_threshold: Self::default_exact_threshold(),
            search_budget: Self::default_search_budget(),
            candidate_listing_limit: Self::default_listing_limit(),
            max_candidate_sums: Self::default_max_candidate_sums(),
            max_decimals: Self::default_max_decimals(),
            concurrency: Self::default_concurrency(),
        }
    }
}
