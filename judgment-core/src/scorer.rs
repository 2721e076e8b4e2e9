//! Scorer abstraction: API-hosted and locally-executed metric evaluators.
//!
//! The two scorer classes are a tagged sum type ([`Scorer`]) so the
//! orchestrator's partition step is a pure pattern match. API scorers are
//! opaque config carriers; only local scorers expose `score_example`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{JudgmentError, Result};
use crate::example::Example;
use crate::result::ScorerData;

/// Identifier of a metric family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScoreKind {
    Faithfulness,
    AnswerCorrectness,
    AnswerRelevancy,
    ContextualPrecision,
    ContextualRecall,
    ContextualRelevancy,
    Hallucination,
    Summarization,
    ExecutionOrder,
    JsonCorrectness,
    Comparison,
    Groundedness,
    Custom(String),
}

impl ScoreKind {
    /// The snake_case wire tag (`score_type` on the backend).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Faithfulness => "faithfulness",
            Self::AnswerCorrectness => "answer_correctness",
            Self::AnswerRelevancy => "answer_relevancy",
            Self::ContextualPrecision => "contextual_precision",
            Self::ContextualRecall => "contextual_recall",
            Self::ContextualRelevancy => "contextual_relevancy",
            Self::Hallucination => "hallucination",
            Self::Summarization => "summarization",
            Self::ExecutionOrder => "execution_order",
            Self::JsonCorrectness => "json_correctness",
            Self::Comparison => "comparison",
            Self::Groundedness => "groundedness",
            Self::Custom(name) => name.as_str(),
        }
    }

    /// Parse a wire tag. Unknown tags become [`ScoreKind::Custom`].
    pub fn parse(tag: &str) -> Self {
        match tag {
            "faithfulness" => Self::Faithfulness,
            "answer_correctness" => Self::AnswerCorrectness,
            "answer_relevancy" => Self::AnswerRelevancy,
            "contextual_precision" => Self::ContextualPrecision,
            "contextual_recall" => Self::ContextualRecall,
            "contextual_relevancy" => Self::ContextualRelevancy,
            "hallucination" => Self::Hallucination,
            "summarization" => Self::Summarization,
            "execution_order" => Self::ExecutionOrder,
            "json_correctness" => Self::JsonCorrectness,
            "comparison" => Self::Comparison,
            "groundedness" => Self::Groundedness,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Whether thresholds for this kind escape the `[0, 1]` bound.
    /// Comparison scores are raw distances, so any non-negative threshold
    /// is legal.
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Comparison)
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ScoreKind {
    fn serialize<S: Serializer>(&self, ser: S) -> std::result::Result<S::Ok, S::Error> {
        ser.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScoreKind {
    fn deserialize<D: Deserializer<'de>>(de: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(de)?;
        Ok(Self::parse(&tag))
    }
}

/// Configuration shared by both scorer classes.
///
/// The threshold invariant is enforced at construction and on every
/// mutation, so a `ScorerConfig` in hand is always valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    pub kind: ScoreKind,
    threshold: f64,
    strict_mode: bool,
    #[serde(default)]
    pub include_reason: bool,
    #[serde(default)]
    pub async_mode: bool,
    #[serde(default)]
    pub verbose_mode: bool,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub additional_metadata: HashMap<String, Value>,
}

impl ScorerConfig {
    /// Create a config, validating the threshold for the metric kind.
    pub fn new(kind: ScoreKind, threshold: f64) -> Result<Self> {
        validate_threshold(&kind, threshold)?;
        Ok(Self {
            kind,
            threshold,
            strict_mode: false,
            include_reason: false,
            async_mode: false,
            verbose_mode: false,
            additional_metadata: HashMap::new(),
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn strict_mode(&self) -> bool {
        self.strict_mode
    }

    /// Change the threshold, revalidating for this kind.
    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        validate_threshold(&self.kind, threshold)?;
        self.threshold = threshold;
        Ok(())
    }

    /// Enable or disable strict mode. Enabling forces the threshold to 1.0
    /// regardless of what it was constructed with.
    pub fn set_strict_mode(&mut self, strict: bool) {
        self.strict_mode = strict;
        if strict {
            self.threshold = 1.0;
        }
    }

    /// Builder-style strict mode toggle.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.set_strict_mode(strict);
        self
    }

    /// The metric's success predicate: did this score meet the threshold?
    pub fn success_check(&self, score: f64) -> bool {
        score >= self.threshold
    }
}

/// Validate a threshold for a metric kind: `[0, 1]` for bounded kinds,
/// `>= 0` for the unbounded set.
pub fn validate_threshold(kind: &ScoreKind, threshold: f64) -> Result<()> {
    if kind.is_unbounded() {
        if threshold < 0.0 {
            return Err(JudgmentError::validation(format!(
                "threshold for '{kind}' must be non-negative, got {threshold}"
            )));
        }
    } else if !(0.0..=1.0).contains(&threshold) {
        return Err(JudgmentError::validation(format!(
            "threshold for '{kind}' must be between 0 and 1, got {threshold}"
        )));
    }
    Ok(())
}

/// A scorer evaluated on the Judgment backend.
///
/// The client only ever serializes its configuration; there is no local
/// scoring path for this class.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiScorer {
    pub config: ScorerConfig,
    /// Kind-specific keyword arguments forwarded verbatim to the backend.
    pub kwargs: HashMap<String, Value>,
}

impl ApiScorer {
    pub fn new(kind: ScoreKind, threshold: f64) -> Result<Self> {
        Ok(Self {
            config: ScorerConfig::new(kind, threshold)?,
            kwargs: HashMap::new(),
        })
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.kwargs.insert(key.into(), value);
        self
    }

    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.config.set_strict_mode(strict);
        self
    }

    /// API scorers cannot run locally. Calling this is always an error.
    pub fn score_example(&self, _example: &Example) -> Result<ScorerData> {
        Err(JudgmentError::ScorerExecution {
            scorer: self.config.kind.to_string(),
            message: "API scorers are evaluated on the server side".into(),
        })
    }
}

// Wire shape: {"score_type": ..., "threshold": ..., <kwargs...>}.
impl Serialize for ApiScorer {
    fn serialize<S: Serializer>(&self, ser: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = ser.serialize_map(Some(2 + self.kwargs.len()))?;
        map.serialize_entry("score_type", self.config.kind.as_str())?;
        map.serialize_entry("threshold", &self.config.threshold())?;
        if self.config.strict_mode() {
            map.serialize_entry("strict_mode", &true)?;
        }
        if self.config.include_reason {
            map.serialize_entry("include_reason", &true)?;
        }
        for (key, value) in &self.kwargs {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Eagerly resolve an API scorer for a metric kind.
///
/// This replaces the deferred wrapper-loading indirection: the scorer is
/// fully constructed before it ever reaches an `EvaluationRun`.
pub fn load_api_scorer(kind: ScoreKind, threshold: f64) -> Result<ApiScorer> {
    ApiScorer::new(kind, threshold)
}

/// A scorer executed in-process.
///
/// Implementations may call out to an external judge model; from the
/// pipeline's perspective the whole contract is
/// `score_example(example) -> ScorerData`.
#[async_trait]
pub trait LocalScorer: Send + Sync {
    /// Shared scorer configuration (kind, threshold, flags).
    fn config(&self) -> &ScorerConfig;

    /// The metric name reported in `ScorerData`.
    fn name(&self) -> &str {
        self.config().kind.as_str()
    }

    /// Score one example.
    async fn score_example(&self, example: &Example) -> Result<ScorerData>;
}

/// Either scorer class, tagged. The orchestrator partitions a run's
/// scorers with a pattern match over this type.
#[derive(Clone)]
pub enum Scorer {
    Api(ApiScorer),
    Local(Arc<dyn LocalScorer>),
}

impl Scorer {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Api(_))
    }

    pub fn config(&self) -> &ScorerConfig {
        match self {
            Self::Api(scorer) => &scorer.config,
            Self::Local(scorer) => scorer.config(),
        }
    }

    pub fn kind(&self) -> &ScoreKind {
        &self.config().kind
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Api(scorer) => scorer.config.kind.as_str(),
            Self::Local(scorer) => scorer.name(),
        }
    }
}

impl fmt::Debug for Scorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(scorer) => f.debug_tuple("Api").field(scorer).finish(),
            Self::Local(scorer) => f
                .debug_struct("Local")
                .field("name", &scorer.name())
                .field("config", scorer.config())
                .finish(),
        }
    }
}

/// Reference local scorer: exact string match between actual and expected
/// output. Scores 1.0 on equality, 0.0 otherwise.
pub struct ExactMatchScorer {
    config: ScorerConfig,
}

impl ExactMatchScorer {
    pub fn new(threshold: f64) -> Result<Self> {
        Ok(Self {
            config: ScorerConfig::new(ScoreKind::Custom("exact_match".into()), threshold)?,
        })
    }
}

#[async_trait]
impl LocalScorer for ExactMatchScorer {
    fn config(&self) -> &ScorerConfig {
        &self.config
    }

    async fn score_example(&self, example: &Example) -> Result<ScorerData> {
        let actual = example.actual_output.as_ref().ok_or_else(|| {
            JudgmentError::ScorerExecution {
                scorer: self.name().to_string(),
                message: "example has no actual_output".into(),
            }
        })?;
        let expected = example.expected_output.as_ref().ok_or_else(|| {
            JudgmentError::ScorerExecution {
                scorer: self.name().to_string(),
                message: "example has no expected_output".into(),
            }
        })?;

        let score = if actual.as_text() == expected.as_text() {
            1.0
        } else {
            0.0
        };
        let mut data = ScorerData::new(self.name(), score, self.config.threshold());
        data.success = self.config.success_check(score);
        Ok(data)
    }
}
