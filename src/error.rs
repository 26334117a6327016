use chrono::NaiveDate;
use thiserror::Error;

/// Errors reported by the optimization engine to its caller.
///
/// Malformed geometry and malformed rule expressions are not errors: the former
/// falls back to a default site, the latter degrades to a failed check.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// No active rule set covers the project's jurisdiction, category and date.
    #[error(
        "no applicable rules for {country_code}/{jurisdiction_code} (category '{category}') on {date}"
    )]
    NoApplicableRules {
        country_code: String,
        jurisdiction_code: String,
        category: String,
        date: NaiveDate,
    },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
