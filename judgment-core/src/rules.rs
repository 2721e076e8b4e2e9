//! Alerting rules evaluated over completed scoring vectors.

use std::collections::HashMap;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::{JudgmentError, Result};
use crate::scorer::ApiScorer;

/// How a rule combines its conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineType {
    /// Every condition must pass.
    All,
    /// At least one condition must pass.
    Any,
}

/// Where to send alert notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub communication_methods: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_addresses: Vec<String>,
}

/// One threshold predicate over a metric.
///
/// The condition delegates to the metric's own success predicate, so a
/// strict-mode metric alerts only at exactly 1.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub metric: ApiScorer,
}

impl Condition {
    pub fn new(metric: ApiScorer) -> Self {
        Self { metric }
    }

    pub fn metric_name(&self) -> &str {
        self.metric.config.kind.as_str()
    }

    pub fn threshold(&self) -> f64 {
        self.metric.config.threshold()
    }

    /// Evaluate a measured value against the metric's threshold.
    pub fn evaluate(&self, value: f64) -> bool {
        self.metric.config.success_check(value)
    }
}

/// A named alerting rule.
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub rule_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub conditions: Vec<Condition>,
    pub combine_type: CombineType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationConfig>,
}

impl Rule {
    /// Create a rule. Fails if the condition list is empty.
    pub fn new(
        name: impl Into<String>,
        conditions: Vec<Condition>,
        combine_type: CombineType,
    ) -> Result<Self> {
        if conditions.is_empty() {
            return Err(JudgmentError::validation(
                "a rule must have at least one condition",
            ));
        }
        Ok(Self {
            rule_id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            conditions,
            combine_type,
            notification: None,
        })
    }

    pub fn with_notification(mut self, notification: NotificationConfig) -> Self {
        self.notification = Some(notification);
        self
    }
}

/// Did a rule fire?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Triggered,
    NotTriggered,
}

/// Per-condition pass/fail detail inside an [`AlertResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionResult {
    pub metric: String,
    pub threshold: f64,
    /// The measured value, absent when the scores map had no entry for
    /// this metric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub passed: bool,
}

/// The outcome of evaluating one rule against one score vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertResult {
    pub status: AlertStatus,
    pub rule_id: String,
    pub rule_name: String,
    pub conditions_result: Vec<ConditionResult>,
    pub metadata: HashMap<String, Value>,
}

/// Default batch width for [`RulesEngine::evaluate_rules_batch`].
pub const DEFAULT_MAX_CONCURRENT: usize = 50;

/// Evaluates a fixed set of rules against score vectors.
pub struct RulesEngine {
    rules: Vec<Rule>,
    max_concurrent: usize,
}

impl RulesEngine {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Bound the number of examples evaluated in flight by the batch
    /// variant. Values below 1 are clamped to 1.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate every rule against one score vector.
    ///
    /// Returns a map keyed by rule id. A metric missing from `scores`
    /// fails its condition. The result metadata carries the supplied
    /// entries plus a `timestamp` defaulted to now when absent.
    pub fn evaluate_rules(
        &self,
        scores: &HashMap<String, f64>,
        metadata: &HashMap<String, Value>,
    ) -> HashMap<String, AlertResult> {
        let mut results = HashMap::with_capacity(self.rules.len());
        for rule in &self.rules {
            let conditions_result: Vec<ConditionResult> = rule
                .conditions
                .iter()
                .map(|condition| {
                    let value = scores.get(condition.metric_name()).copied();
                    ConditionResult {
                        metric: condition.metric_name().to_string(),
                        threshold: condition.threshold(),
                        value,
                        passed: value.is_some_and(|v| condition.evaluate(v)),
                    }
                })
                .collect();

            let triggered = match rule.combine_type {
                CombineType::All => conditions_result.iter().all(|c| c.passed),
                CombineType::Any => conditions_result.iter().any(|c| c.passed),
            };

            let mut result_metadata = metadata.clone();
            result_metadata
                .entry("timestamp".to_string())
                .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

            debug!(rule = %rule.name, triggered, "rule evaluated");
            results.insert(
                rule.rule_id.clone(),
                AlertResult {
                    status: if triggered {
                        AlertStatus::Triggered
                    } else {
                        AlertStatus::NotTriggered
                    },
                    rule_id: rule.rule_id.clone(),
                    rule_name: rule.name.clone(),
                    conditions_result,
                    metadata: result_metadata,
                },
            );
        }
        results
    }

    /// Evaluate the rules for many examples with bounded fan-out.
    ///
    /// Example ids are processed in fixed-size chunks of `max_concurrent`;
    /// each chunk completes fully before the next starts, so at most
    /// `max_concurrent` evaluations are ever in flight.
    pub async fn evaluate_rules_batch(
        &self,
        example_scores: &HashMap<String, HashMap<String, f64>>,
        metadata: &HashMap<String, Value>,
    ) -> HashMap<String, HashMap<String, AlertResult>> {
        let mut results = HashMap::with_capacity(example_scores.len());
        let example_ids: Vec<&String> = example_scores.keys().collect();

        for chunk in example_ids.chunks(self.max_concurrent) {
            let futures = chunk.iter().map(|example_id| async move {
                let scores = &example_scores[*example_id];
                ((*example_id).clone(), self.evaluate_rules(scores, metadata))
            });
            for (example_id, alerts) in join_all(futures).await {
                results.insert(example_id, alerts);
            }
        }
        results
    }
}
