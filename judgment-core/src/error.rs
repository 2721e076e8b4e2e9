//! Error types for the Judgment SDK.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering validation, remote API, result-alignment, and scorer-execution
//! failure domains.

use thiserror::Error;

/// Top-level error type for the Judgment SDK.
#[derive(Debug, Error)]
pub enum JudgmentError {
    /// Malformed construction input (bad threshold, empty examples/scorers,
    /// unrecognized model). Never retried.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A remote call against the evaluation backend failed.
    #[error("{}", api_error_message(.status, .detail))]
    Api { status: Option<u16>, detail: String },

    /// An evaluation run with this name already has logged results for the
    /// project and `override` was not set.
    #[error("Evaluation run '{eval_name}' already exists for project '{project_name}'. Use override=true to replace it")]
    NameCollision {
        eval_name: String,
        project_name: String,
    },

    /// API-path and local-path results could not be reconciled. This is an
    /// internal invariant violation and is never downgraded by
    /// `ignore_errors`.
    #[error("Result alignment error: {message}")]
    Alignment { message: String },

    /// A local scorer's `score_example` failed.
    #[error("Scorer '{scorer}' execution failed: {message}")]
    ScorerExecution { scorer: String, message: String },

    /// The CI gate found failing results. The message enumerates every
    /// failure across the run.
    #[error("Assertion failed with {} failure(s):\n{}", .failures.len(), .failures.join("\n"))]
    AssertionFailed { failures: Vec<String> },

    /// SDK configuration problem (missing credentials, bad endpoint URL).
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

fn api_error_message(status: &Option<u16>, detail: &str) -> String {
    match status {
        Some(code) => format!("API error (HTTP {code}): {detail}"),
        None => format!("API error: {detail}"),
    }
}

impl JudgmentError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for an alignment invariant violation.
    pub fn alignment(message: impl Into<String>) -> Self {
        Self::Alignment {
            message: message.into(),
        }
    }

    /// Whether this error may be downgraded to a per-example error field
    /// when the caller passed `ignore_errors=true`. Validation and
    /// alignment failures indicate caller or SDK bugs and always abort.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Validation { .. } | Self::Alignment { .. } | Self::NameCollision { .. }
        )
    }
}

/// A type alias for results using the top-level `JudgmentError`.
pub type Result<T> = std::result::Result<T, JudgmentError>;
