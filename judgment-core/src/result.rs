//! Per-example scoring output types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::example::Example;

/// One scorer's output for one example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerData {
    pub name: String,
    pub score: f64,
    pub threshold: f64,
    /// Whether the score met the threshold. Forced to `false` whenever
    /// `error` is set.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose_logs: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub additional_metadata: HashMap<String, Value>,
}

impl ScorerData {
    /// A successful-or-not scoring outcome with no error.
    pub fn new(name: impl Into<String>, score: f64, threshold: f64) -> Self {
        Self {
            name: name.into(),
            score,
            threshold,
            success: score >= threshold,
            reason: None,
            error: None,
            evaluation_cost: None,
            verbose_logs: None,
            additional_metadata: HashMap::new(),
        }
    }

    /// An errored outcome. Success is forced false.
    pub fn errored(name: impl Into<String>, threshold: f64, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0.0,
            threshold,
            success: false,
            reason: None,
            error: Some(error.into()),
            evaluation_cost: None,
            verbose_logs: None,
            additional_metadata: HashMap::new(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// The outcome for one example: the example itself, every scorer's data,
/// and an optional top-level error.
///
/// A run always produces exactly one `ScoringResult` per input example, in
/// input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub data_object: Example,
    #[serde(default)]
    pub scorers_data: Vec<ScorerData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScoringResult {
    /// A result carrying scorer outputs for an example.
    pub fn new(data_object: Example, scorers_data: Vec<ScorerData>) -> Self {
        Self {
            data_object,
            scorers_data,
            error: None,
        }
    }

    /// An empty result for an example whose scoring failed at the run
    /// level (e.g. the whole API dispatch errored under `ignore_errors`).
    pub fn errored(data_object: Example, error: impl Into<String>) -> Self {
        Self {
            data_object,
            scorers_data: Vec::new(),
            error: Some(error.into()),
        }
    }
}
