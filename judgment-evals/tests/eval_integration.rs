//! End-to-end orchestration tests against a mocked evaluation backend.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use judgment_core::scorer::{ApiScorer, ExactMatchScorer, ScoreKind, Scorer};
use judgment_evals::{
    assert_test, EvaluationRun, Evaluator, Example, JudgmentConfig, JudgmentError, ModelSpec,
    RunOptions,
};

fn test_config(server: &MockServer) -> JudgmentConfig {
    JudgmentConfig::new("jk-test-key", "org-42").with_api_url(server.uri())
}

fn faithfulness() -> Scorer {
    Scorer::Api(ApiScorer::new(ScoreKind::Faithfulness, 0.7).unwrap())
}

fn exact_match() -> Scorer {
    Scorer::Local(Arc::new(ExactMatchScorer::new(1.0).unwrap()))
}

fn capital_example(actual: &str) -> Example {
    Example::new("What is the capital of France?")
        .with_actual_output(actual)
        .with_expected_output("Paris is the capital of France.")
}

fn basic_run(scorers: Vec<Scorer>, examples: Vec<Example>) -> EvaluationRun {
    EvaluationRun::builder()
        .project_name("demo")
        .eval_name("run-1")
        .examples(examples)
        .scorers(scorers)
        .model(ModelSpec::single("gpt-4o"))
        .build()
        .unwrap()
}

/// Mount a permissive name-collision check (no collision).
async fn mount_no_collision(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/eval-run-name-exists/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"exists": false})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn sync_run_merges_api_and_local_results_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/evaluate/"))
        .and(header("X-Organization-Id", "org-42"))
        .and(header("Authorization", "Bearer jk-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"scorers_data": [{"name": "faithfulness", "score": 0.9, "threshold": 0.7, "success": true}]},
            {"scorers_data": [{"name": "faithfulness", "score": 0.4, "threshold": 0.7, "success": false}]},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let run = basic_run(
        vec![faithfulness(), exact_match()],
        vec![
            capital_example("Paris is the capital of France."),
            capital_example("Rome."),
        ],
    );

    let evaluator = Evaluator::new(test_config(&server));
    let results = evaluator
        .run_evaluation(run, RunOptions::default())
        .await
        .unwrap();

    // Alignment invariant: one result per example, input order preserved.
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].data_object.example_index, Some(0));
    assert_eq!(results[1].data_object.example_index, Some(1));

    // Merged scorer data: API entries first, then local.
    let names: Vec<&str> = results[0]
        .scorers_data
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(names, vec!["faithfulness", "exact_match"]);

    assert!(results[0].scorers_data[1].success);
    assert!(!results[1].scorers_data[1].success);
}

#[tokio::test]
async fn name_collision_aborts_before_any_dispatch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/eval-run-name-exists/"))
        .and(body_partial_json(json!({
            "eval_name": "run-1",
            "project_name": "demo",
        })))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    // Neither adapter may be reached.
    Mock::given(method("POST"))
        .and(path("/evaluate/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let run = EvaluationRun::builder()
        .project_name("demo")
        .eval_name("run-1")
        .log_results(true)
        .examples(vec![capital_example("Paris is the capital of France.")])
        .scorers(vec![faithfulness()])
        .model(ModelSpec::single("gpt-4o"))
        .build()
        .unwrap();

    let evaluator = Evaluator::new(test_config(&server));
    let err = evaluator
        .run_evaluation(run, RunOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, JudgmentError::NameCollision { .. }));
}

#[tokio::test]
async fn override_skips_collision_guard() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/eval-run-name-exists/"))
        .respond_with(ResponseTemplate::new(409))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/evaluate/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"scorers_data": [{"name": "faithfulness", "score": 0.9, "threshold": 0.7, "success": true}]},
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/log_eval_results/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ui_results_url": "https://app.judgmentlabs.ai/r/1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let run = EvaluationRun::builder()
        .project_name("demo")
        .eval_name("run-1")
        .log_results(true)
        .examples(vec![capital_example("Paris is the capital of France.")])
        .scorers(vec![faithfulness()])
        .model(ModelSpec::single("gpt-4o"))
        .build()
        .unwrap();

    let evaluator = Evaluator::new(test_config(&server));
    let results = evaluator
        .run_evaluation(
            run,
            RunOptions {
                override_existing: true,
                ..RunOptions::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn async_dispatch_returns_empty_even_when_enqueue_fails() {
    let server = MockServer::start().await;
    mount_no_collision(&server).await;

    Mock::given(method("POST"))
        .and(path("/add_to_run_eval_queue/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "queue down"})))
        .expect(1)
        .mount(&server)
        .await;

    let run = basic_run(
        vec![faithfulness(), exact_match()],
        vec![capital_example("Paris is the capital of France.")],
    );

    let evaluator = Evaluator::new(test_config(&server));
    let results = evaluator.a_run_evaluation(run).await.unwrap();

    // Fire-and-forget contract: empty list, no error, regardless of the
    // queue submission outcome or scorer composition.
    assert!(results.is_empty());
}

#[tokio::test]
async fn poll_lifecycle_fetches_results_on_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/check-eval-status/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "processing", "progress": 0.5})),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/check-eval-status/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "complete"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/fetch_eval_results/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "r-1", "result": {
                "data_object": {
                    "input": "What is the capital of France?",
                    "example_id": "e-1",
                    "timestamp": "2026-08-25T00:00:00Z",
                    "name": "example",
                },
                "scorers_data": [{"name": "faithfulness", "score": 0.9, "threshold": 0.7, "success": true}],
            }},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let run = basic_run(
        vec![faithfulness()],
        vec![capital_example("Paris is the capital of France.")],
    );

    let evaluator = Evaluator::new(test_config(&server));
    let results = evaluator
        .client()
        .poll_until_complete(&run, Duration::from_millis(5), 10)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].scorers_data[0].name, "faithfulness");
}

#[tokio::test]
async fn poll_timeout_returns_empty_not_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/check-eval-status/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "queued"})))
        .mount(&server)
        .await;

    let run = basic_run(
        vec![faithfulness()],
        vec![capital_example("Paris is the capital of France.")],
    );

    let evaluator = Evaluator::new(test_config(&server));
    let results = evaluator
        .client()
        .poll_until_complete(&run, Duration::from_millis(1), 3)
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn poll_surfaces_failed_status_as_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/check-eval-status/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "failed", "error": "judge model unavailable"})),
        )
        .mount(&server)
        .await;

    let run = basic_run(
        vec![faithfulness()],
        vec![capital_example("Paris is the capital of France.")],
    );

    let evaluator = Evaluator::new(test_config(&server));
    let err = evaluator
        .client()
        .poll_until_complete(&run, Duration::from_millis(1), 3)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("judge model unavailable"));
}

#[tokio::test]
async fn api_failure_degrades_per_example_under_ignore_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/evaluate/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "scorer crashed"})))
        .mount(&server)
        .await;

    let examples = vec![
        capital_example("Paris is the capital of France."),
        capital_example("Rome."),
    ];
    let evaluator = Evaluator::new(test_config(&server));

    // ignore_errors=true: degrade to one errored result per example.
    let run = basic_run(vec![faithfulness()], examples.clone());
    let results = evaluator
        .run_evaluation(run, RunOptions::default())
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].error.as_deref().unwrap().contains("scorer crashed"));
    assert!(results[0].scorers_data.is_empty());
    assert!(assert_test(&results).is_err());

    // ignore_errors=false: the run aborts with the typed API error.
    let run = basic_run(vec![faithfulness()], examples);
    let err = evaluator
        .run_evaluation(
            run,
            RunOptions {
                ignore_errors: false,
                ..RunOptions::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, JudgmentError::Api { status: Some(500), .. }));
}

#[tokio::test]
async fn short_api_response_never_shrinks_the_result_list() {
    let server = MockServer::start().await;

    // One entry for a two-example run: the backend dropped a result.
    Mock::given(method("POST"))
        .and(path("/evaluate/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"scorers_data": [{"name": "faithfulness", "score": 0.9, "threshold": 0.7, "success": true}]},
        ])))
        .mount(&server)
        .await;

    let examples = vec![
        capital_example("Paris is the capital of France."),
        capital_example("Rome."),
    ];
    let evaluator = Evaluator::new(test_config(&server));

    // Under ignore_errors the mismatch degrades to one errored result per
    // example; the list stays 1:1 with the input.
    let run = basic_run(vec![faithfulness()], examples.clone());
    let results = evaluator
        .run_evaluation(run, RunOptions::default())
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results
        .iter()
        .all(|r| r.error.as_deref().unwrap().contains("1 results for 2 examples")));

    // Without ignore_errors the mismatch is a hard API error.
    let run = basic_run(vec![faithfulness()], examples);
    let err = evaluator
        .run_evaluation(
            run,
            RunOptions {
                ignore_errors: false,
                ..RunOptions::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, JudgmentError::Api { .. }));
}

#[tokio::test]
async fn missing_required_field_warns_but_still_dispatches() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/evaluate/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"scorers_data": [], "error": "expected_output missing"},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    // No expected_output, scored by answer_correctness: advisory only.
    let example = Example::new("What is the capital of France?")
        .with_actual_output("Paris is the capital of France.");
    let run = basic_run(
        vec![Scorer::Api(
            ApiScorer::new(ScoreKind::AnswerCorrectness, 0.5).unwrap(),
        )],
        vec![example],
    );

    let evaluator = Evaluator::new(test_config(&server));
    let results = evaluator
        .run_evaluation(run, RunOptions::default())
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].error.as_deref(), Some("expected_output missing"));
}

#[tokio::test]
async fn local_only_run_never_touches_the_network() {
    // Port 9 is discard; any request would hang or fail loudly.
    let config = JudgmentConfig::new("jk-test-key", "org-42").with_api_url("http://127.0.0.1:9");

    let run = basic_run(
        vec![exact_match()],
        vec![
            capital_example("Paris is the capital of France."),
            capital_example("Rome."),
        ],
    );

    let evaluator = Evaluator::new(config);
    let results = evaluator
        .run_evaluation(run, RunOptions::default())
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].scorers_data[0].success);
    assert!(!results[1].scorers_data[0].success);
    assert!(assert_test(&results).is_err());
    assert!(assert_test(&results[..1]).is_ok());
}
