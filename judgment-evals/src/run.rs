//! The validated bundle of examples, scorers, and run metadata.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use judgment_core::error::{JudgmentError, Result};
use judgment_core::example::Example;
use judgment_core::models::{is_recognized_model, ModelSpec};
use judgment_core::rules::Rule;
use judgment_core::scorer::{ApiScorer, LocalScorer, Scorer};
use judgment_core::JudgmentConfig;

/// An evaluation request: examples, scorers, judge model, and metadata.
///
/// Construction goes through [`EvaluationRunBuilder`], which runs the full
/// validation chain; an `EvaluationRun` in hand is always valid. The only
/// mutation after construction is the orchestrator's example normalization.
#[derive(Debug, Clone)]
pub struct EvaluationRun {
    pub project_name: Option<String>,
    pub eval_name: Option<String>,
    pub examples: Vec<Example>,
    pub scorers: Vec<Scorer>,
    pub model: ModelSpec,
    pub aggregator: Option<String>,
    pub log_results: bool,
    pub metadata: HashMap<String, Value>,
    pub rules: Vec<Rule>,
}

impl EvaluationRun {
    pub fn builder() -> EvaluationRunBuilder {
        EvaluationRunBuilder::default()
    }

    /// Project and eval names, which validation guarantees are present
    /// whenever `log_results` is set.
    pub fn names(&self) -> (&str, &str) {
        (
            self.project_name.as_deref().unwrap_or_default(),
            self.eval_name.as_deref().unwrap_or_default(),
        )
    }

    /// Orchestrator bookkeeping: pin every example to its position in the
    /// run and refresh its timestamp.
    pub fn normalize_examples(&mut self) {
        for (index, example) in self.examples.iter_mut().enumerate() {
            example.normalize(index);
        }
    }

    /// Split the scorers into their API and local classes.
    pub fn partition_scorers(&self) -> (Vec<ApiScorer>, Vec<Arc<dyn LocalScorer>>) {
        let mut api = Vec::new();
        let mut local = Vec::new();
        for scorer in &self.scorers {
            match scorer {
                Scorer::Api(scorer) => api.push(scorer.clone()),
                Scorer::Local(scorer) => local.push(Arc::clone(scorer)),
            }
        }
        (api, local)
    }

    /// The backend submission payload (snake_case wire shape). Only API
    /// scorers are serialized; local scorers never leave the process.
    pub fn wire_payload(&self, config: &JudgmentConfig) -> Value {
        let (api_scorers, _) = self.partition_scorers();
        serde_json::json!({
            "project_name": self.project_name,
            "eval_name": self.eval_name,
            "examples": self.examples,
            "scorers": api_scorers,
            "model": self.model,
            "aggregator": self.aggregator,
            "metadata": self.metadata,
            "log_results": self.log_results,
            "judgment_api_key": config.api_key,
            "rules": self.rules,
        })
    }
}

/// Builder running the ordered validation chain from the run contract:
/// name presence (conditional on `log_results`) -> examples -> scorers ->
/// model -> aggregator -> rule/scorer compatibility. The first failure
/// wins and no partially constructed run escapes.
#[derive(Debug, Default)]
pub struct EvaluationRunBuilder {
    project_name: Option<String>,
    eval_name: Option<String>,
    examples: Vec<Example>,
    scorers: Vec<Scorer>,
    model: Option<ModelSpec>,
    aggregator: Option<String>,
    log_results: bool,
    metadata: HashMap<String, Value>,
    rules: Vec<Rule>,
}

impl EvaluationRunBuilder {
    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    pub fn eval_name(mut self, name: impl Into<String>) -> Self {
        self.eval_name = Some(name.into());
        self
    }

    pub fn examples(mut self, examples: Vec<Example>) -> Self {
        self.examples = examples;
        self
    }

    pub fn scorers(mut self, scorers: Vec<Scorer>) -> Self {
        self.scorers = scorers;
        self
    }

    pub fn model(mut self, model: ModelSpec) -> Self {
        self.model = Some(model);
        self
    }

    pub fn aggregator(mut self, aggregator: impl Into<String>) -> Self {
        self.aggregator = Some(aggregator.into());
        self
    }

    pub fn log_results(mut self, log_results: bool) -> Self {
        self.log_results = log_results;
        self
    }

    pub fn metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn build(self) -> Result<EvaluationRun> {
        if self.log_results {
            if self.project_name.as_deref().unwrap_or("").is_empty() {
                return Err(JudgmentError::validation(
                    "project_name is required when log_results is true",
                ));
            }
            if self.eval_name.as_deref().unwrap_or("").is_empty() {
                return Err(JudgmentError::validation(
                    "eval_name is required when log_results is true",
                ));
            }
        }

        if self.examples.is_empty() {
            return Err(JudgmentError::validation("examples cannot be empty"));
        }

        if self.scorers.is_empty() {
            return Err(JudgmentError::validation("scorers cannot be empty"));
        }

        let model = self
            .model
            .ok_or_else(|| JudgmentError::validation("model is required"))?;

        match &model {
            ModelSpec::Judge(_) => {
                // An external judge scores in the caller's process; the
                // backend has nothing to run.
                if self.scorers.iter().any(Scorer::is_remote) {
                    return Err(JudgmentError::validation(
                        "when model is an external judge handle, every scorer must be a local scorer",
                    ));
                }
            }
            spec => {
                for name in spec.names() {
                    if !is_recognized_model(name) {
                        return Err(JudgmentError::validation(format!(
                            "model '{name}' is not recognized by the evaluation backend"
                        )));
                    }
                }
            }
        }

        if model.is_multiple() && self.aggregator.as_deref().unwrap_or("").is_empty() {
            return Err(JudgmentError::validation(
                "aggregator is required when model is a list",
            ));
        }

        if !self.rules.is_empty() && self.scorers.iter().any(|s| !s.is_remote()) {
            return Err(JudgmentError::validation(
                "rules can only reference API-hosted metrics; remove local scorers or rules",
            ));
        }

        Ok(EvaluationRun {
            project_name: self.project_name,
            eval_name: self.eval_name,
            examples: self.examples,
            scorers: self.scorers,
            model,
            aggregator: self.aggregator,
            log_results: self.log_results,
            metadata: self.metadata,
            rules: self.rules,
        })
    }
}
