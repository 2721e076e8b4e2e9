//! # judgment-evals — evaluation-run orchestration for the Judgment SDK
//!
//! Takes a validated [`EvaluationRun`], splits its scorers into API-hosted
//! and local classes, dispatches each class to its adapter, reconciles the
//! two result streams under a strict 1:1 alignment invariant, and
//! optionally persists the outcome to the backend.
//!
//! Entry points:
//!
//! - [`Evaluator::run_evaluation`] — the synchronous (blocking-until-scored)
//!   pipeline
//! - [`Evaluator::a_run_evaluation`] — async dispatch: enqueue and return
//! - [`assert_test`] — the CI gate over a finished result list

pub mod client;
pub mod local;
pub mod merge;
pub mod orchestrator;
pub mod run;

pub use client::{EvalStatus, EvalStatusReport, JudgmentApiClient};
pub use local::execute_local_eval;
pub use merge::{check_missing_scorer_data, merge_results};
pub use orchestrator::{assert_test, Evaluator, RunOptions};
pub use run::{EvaluationRun, EvaluationRunBuilder};

// The foundation types callers need alongside the pipeline.
pub use judgment_core::{
    Example, JudgmentConfig, JudgmentError, ModelSpec, Result, ScorerData, ScoringResult,
};
