//! # judgment-core — data model and scorer abstraction for the Judgment SDK
//!
//! This crate holds the pieces the evaluation pipeline is built from:
//!
//! - **Configuration** ([`JudgmentConfig`]) — explicit, injected, resolved
//!   from the environment once at the application boundary
//! - **Errors** ([`JudgmentError`]) — the SDK-wide structured error taxonomy
//! - **Data model** ([`Example`], [`ScorerData`], [`ScoringResult`])
//! - **Scorers** ([`Scorer`], [`ApiScorer`], [`LocalScorer`]) — a tagged sum
//!   type over server-side and in-process metric evaluators
//! - **Rules** ([`RulesEngine`]) — threshold alerting over merged scores
//!
//! The orchestration pipeline itself lives in `judgment-evals`.

pub mod config;
pub mod error;
pub mod example;
pub mod models;
pub mod result;
pub mod rules;
pub mod scorer;

pub use config::{JudgmentConfig, DEFAULT_API_URL};
pub use error::{JudgmentError, Result};
pub use example::{Example, StringOrVec};
pub use models::{is_recognized_model, ModelSpec, RECOGNIZED_MODELS};
pub use result::{ScorerData, ScoringResult};
pub use rules::{
    AlertResult, AlertStatus, CombineType, Condition, ConditionResult, NotificationConfig, Rule,
    RulesEngine, DEFAULT_MAX_CONCURRENT,
};
pub use scorer::{
    load_api_scorer, validate_threshold, ApiScorer, ExactMatchScorer, LocalScorer, ScoreKind,
    Scorer, ScorerConfig,
};
