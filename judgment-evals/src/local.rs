//! Local execution adapter: runs local scorers in-process.

use std::sync::Arc;

use tracing::{debug, warn};

use judgment_core::error::Result;
use judgment_core::example::Example;
use judgment_core::result::{ScorerData, ScoringResult};
use judgment_core::scorer::LocalScorer;

/// Run every local scorer against every example, independent of network
/// state.
///
/// Produces exactly one [`ScoringResult`] per example, in input order. A
/// scorer failure on an example is captured into that example's result
/// (errored `ScorerData` plus a result-level error string) when
/// `ignore_errors` is set; otherwise the first failure aborts the whole
/// run.
pub async fn execute_local_eval(
    examples: &[Example],
    scorers: &[Arc<dyn LocalScorer>],
    ignore_errors: bool,
) -> Result<Vec<ScoringResult>> {
    let mut results = Vec::with_capacity(examples.len());

    for example in examples {
        let mut scorers_data = Vec::with_capacity(scorers.len());
        let mut first_error: Option<String> = None;

        for scorer in scorers {
            match scorer.score_example(example).await {
                Ok(data) => scorers_data.push(data),
                Err(error) if ignore_errors => {
                    warn!(
                        scorer = scorer.name(),
                        example_index = ?example.example_index,
                        %error,
                        "local scorer failed; capturing error into result"
                    );
                    scorers_data.push(ScorerData::errored(
                        scorer.name(),
                        scorer.config().threshold(),
                        error.to_string(),
                    ));
                    first_error.get_or_insert_with(|| error.to_string());
                }
                Err(error) => return Err(error),
            }
        }

        debug!(
            example_index = ?example.example_index,
            scorers = scorers_data.len(),
            "local scoring finished for example"
        );
        results.push(ScoringResult {
            data_object: example.clone(),
            scorers_data,
            error: first_error,
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use judgment_core::error::JudgmentError;
    use judgment_core::scorer::{ExactMatchScorer, ScoreKind, ScorerConfig};

    /// A scorer that always fails, for error-path coverage.
    struct FailingScorer {
        config: ScorerConfig,
    }

    impl FailingScorer {
        fn new() -> Self {
            Self {
                config: ScorerConfig::new(ScoreKind::Custom("always_fails".into()), 0.5).unwrap(),
            }
        }
    }

    #[async_trait]
    impl LocalScorer for FailingScorer {
        fn config(&self) -> &ScorerConfig {
            &self.config
        }

        async fn score_example(&self, _example: &Example) -> Result<ScorerData> {
            Err(JudgmentError::ScorerExecution {
                scorer: "always_fails".into(),
                message: "synthetic failure".into(),
            })
        }
    }

    fn matched_example() -> Example {
        Example::new("What is the capital of France?")
            .with_actual_output("Paris is the capital of France.")
            .with_expected_output("Paris is the capital of France.")
    }

    #[tokio::test]
    async fn test_one_result_per_example_in_order() {
        let scorers: Vec<Arc<dyn LocalScorer>> = vec![Arc::new(ExactMatchScorer::new(1.0).unwrap())];
        let examples = vec![
            matched_example(),
            matched_example().with_actual_output("Rome."),
        ];

        let results = execute_local_eval(&examples, &scorers, true).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].scorers_data[0].success);
        assert!(!results[1].scorers_data[0].success);
        assert_eq!(results[0].data_object.input, examples[0].input);
    }

    #[tokio::test]
    async fn test_scorer_error_captured_when_ignoring() {
        let scorers: Vec<Arc<dyn LocalScorer>> = vec![
            Arc::new(ExactMatchScorer::new(1.0).unwrap()),
            Arc::new(FailingScorer::new()),
        ];

        let results = execute_local_eval(&[matched_example()], &scorers, true)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].scorers_data.len(), 2);
        assert!(results[0].scorers_data[0].success);
        assert!(results[0].scorers_data[1].error.is_some());
        assert!(results[0].error.as_deref().unwrap().contains("synthetic failure"));
    }

    #[tokio::test]
    async fn test_scorer_error_propagates_when_strict() {
        let scorers: Vec<Arc<dyn LocalScorer>> = vec![Arc::new(FailingScorer::new())];
        let err = execute_local_eval(&[matched_example()], &scorers, false)
            .await
            .unwrap_err();
        assert!(matches!(err, JudgmentError::ScorerExecution { .. }));
    }
}
