//! The `run_evaluation` state machine.
//!
//! Validating -> Initializing -> Dispatching -> (Remote | Local | Both) ->
//! Merging -> Persisting -> Done, with an async-dispatch short circuit that
//! enqueues the run and returns immediately.

use tracing::{debug, info, warn};

use judgment_core::error::{JudgmentError, Result};
use judgment_core::example::Example;
use judgment_core::result::ScoringResult;
use judgment_core::scorer::{ApiScorer, ScoreKind};
use judgment_core::JudgmentConfig;

use crate::client::JudgmentApiClient;
use crate::local::execute_local_eval;
use crate::merge::{check_missing_scorer_data, merge_results};
use crate::run::EvaluationRun;

/// Per-call orchestration flags.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Skip the run-name collision guard and overwrite logged results.
    pub override_existing: bool,
    /// Degrade recoverable failures into per-example errors instead of
    /// aborting the run. Validation and alignment failures always abort.
    pub ignore_errors: bool,
    /// Enqueue the run for background execution and return immediately
    /// with an empty result list.
    pub async_execution: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            override_existing: false,
            ignore_errors: true,
            async_execution: false,
        }
    }
}

/// Orchestrates evaluation runs against the remote and local adapters.
pub struct Evaluator {
    client: JudgmentApiClient,
}

impl Evaluator {
    pub fn new(config: JudgmentConfig) -> Self {
        Self {
            client: JudgmentApiClient::new(config),
        }
    }

    /// Build from an existing client (shares its connection pool).
    pub fn with_client(client: JudgmentApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &JudgmentApiClient {
        &self.client
    }

    /// Execute an evaluation run end to end.
    ///
    /// Returns one [`ScoringResult`] per example, in input order — except
    /// on the async-dispatch path, which always returns an empty list by
    /// contract (the caller polls separately).
    pub async fn run_evaluation(
        &self,
        mut run: EvaluationRun,
        options: RunOptions,
    ) -> Result<Vec<ScoringResult>> {
        // Name-collision guard, skipped when overriding or not logging.
        if !options.override_existing && run.log_results {
            match self.client.run_name_exists(&run).await {
                Ok(true) => {
                    let (project_name, eval_name) = run.names();
                    return Err(JudgmentError::NameCollision {
                        eval_name: eval_name.to_string(),
                        project_name: project_name.to_string(),
                    });
                }
                Ok(false) => {}
                Err(error) if options.ignore_errors && error.is_recoverable() => {
                    warn!(%error, "run-name collision check failed; proceeding without it");
                }
                Err(error) => return Err(error),
            }
        }

        run.normalize_examples();
        let (api_scorers, local_scorers) = run.partition_scorers();
        debug!(
            api_scorers = api_scorers.len(),
            local_scorers = local_scorers.len(),
            examples = run.examples.len(),
            "dispatching evaluation run"
        );

        required_fields_advisory(&api_scorers, &run.examples);

        if options.async_execution {
            self.client.send_to_queue(&run).await;
            info!(eval_name = ?run.eval_name, "run dispatched to async queue");
            return Ok(Vec::new());
        }

        let api_results = if api_scorers.is_empty() {
            Vec::new()
        } else {
            match self.client.execute_api_eval(&run).await {
                Ok(results) => results,
                Err(error) if options.ignore_errors && error.is_recoverable() => {
                    warn!(%error, "API evaluation failed; degrading to per-example errors");
                    run.examples
                        .iter()
                        .map(|example| ScoringResult::errored(example.clone(), error.to_string()))
                        .collect()
                }
                Err(error) => return Err(error),
            }
        };

        let local_results = if local_scorers.is_empty() {
            Vec::new()
        } else {
            execute_local_eval(&run.examples, &local_scorers, options.ignore_errors).await?
        };

        let merged = merge_results(api_results, local_results)?;
        let merged = check_missing_scorer_data(merged);

        if run.log_results {
            match self.client.log_results(&run, &merged).await {
                Ok(Some(url)) => info!(%url, "view results"),
                Ok(None) => {}
                Err(error) if options.ignore_errors && error.is_recoverable() => {
                    warn!(%error, "failed to log results; returning in-memory results");
                }
                Err(error) => return Err(error),
            }
        }

        Ok(merged)
    }

    /// Async-dispatch entry point: enqueue the run and return immediately.
    /// Tracer-side callers use this to evaluate as a span side effect.
    pub async fn a_run_evaluation(&self, run: EvaluationRun) -> Result<Vec<ScoringResult>> {
        self.run_evaluation(
            run,
            RunOptions {
                async_execution: true,
                ..RunOptions::default()
            },
        )
        .await
    }
}

/// The fields each API metric needs on an example to score meaningfully.
/// A missing field is a warning, never a hard failure: the scorer is still
/// attempted and may report its own error.
fn required_fields_advisory(api_scorers: &[ApiScorer], examples: &[Example]) {
    for scorer in api_scorers {
        for example in examples {
            let missing = match &scorer.config.kind {
                ScoreKind::AnswerCorrectness | ScoreKind::AnswerRelevancy => {
                    example.expected_output.is_none().then_some("expected_output")
                }
                ScoreKind::ContextualPrecision
                | ScoreKind::ContextualRecall
                | ScoreKind::ContextualRelevancy => example
                    .context
                    .as_ref()
                    .is_none_or(Vec::is_empty)
                    .then_some("context"),
                ScoreKind::ExecutionOrder => example
                    .expected_tools
                    .as_ref()
                    .is_none_or(Vec::is_empty)
                    .then_some("expected_tools"),
                _ => None,
            };
            if let Some(field) = missing {
                warn!(
                    scorer = scorer.config.kind.as_str(),
                    example_index = ?example.example_index,
                    field,
                    "example is missing a field this scorer needs; it will be attempted anyway"
                );
            }
        }
    }
}

/// The CI gate: fail loudly on any errored, empty, or unsuccessful result.
///
/// Collects, across all results, every top-level error, every result with
/// no scorer data, and every scorer failure, then raises one aggregate
/// error enumerating all of them. Use this in test suites where
/// `run_evaluation`'s data-returning contract is too forgiving.
pub fn assert_test(results: &[ScoringResult]) -> Result<()> {
    let mut failures = Vec::new();

    for (index, result) in results.iter().enumerate() {
        let position = result.data_object.example_index.unwrap_or(index);
        if let Some(error) = &result.error {
            failures.push(format!("example {position}: {error}"));
        }
        if result.scorers_data.is_empty() {
            failures.push(format!("example {position}: no scorer data produced"));
        }
        for data in &result.scorers_data {
            if !data.success {
                failures.push(format!(
                    "example {position}: scorer '{}' scored {} against threshold {}",
                    data.name, data.score, data.threshold
                ));
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(JudgmentError::AssertionFailed { failures })
    }
}
