//! HTTP adapter for the Judgment evaluation backend.
//!
//! All endpoints are JSON-over-POST. Auth rides on every request as
//! `Authorization: Bearer <api_key>` plus `X-Organization-Id`. The
//! underlying `reqwest::Client` holds the connection pool and is reused
//! across calls; the adapter carries no run-specific state.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use judgment_core::error::{JudgmentError, Result};
use judgment_core::example::Example;
use judgment_core::result::{ScorerData, ScoringResult};
use judgment_core::JudgmentConfig;

use crate::run::EvaluationRun;

/// Lifecycle state of a queued evaluation on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalStatus {
    Queued,
    Processing,
    Complete,
    Failed,
    Unknown,
}

/// One status-endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct EvalStatusReport {
    pub status: EvalStatus,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl EvalStatusReport {
    fn unknown() -> Self {
        Self {
            status: EvalStatus::Unknown,
            progress: None,
            message: None,
            error: None,
        }
    }
}

/// One entry of the synchronous `/evaluate/` response. The backend may
/// echo the example back or rely on index alignment.
#[derive(Debug, Deserialize)]
struct ApiResultEntry {
    #[serde(default, alias = "data_object")]
    example: Option<Example>,
    #[serde(default)]
    scorers_data: Vec<ScorerData>,
    #[serde(default)]
    error: Option<String>,
}

/// One entry of the `/fetch_eval_results/` response.
#[derive(Debug, Deserialize)]
struct FetchedResult {
    #[allow(dead_code)]
    id: Option<String>,
    result: ScoringResult,
}

/// Remote execution adapter: every interaction with the evaluation
/// backend for API-scorer work goes through here.
#[derive(Debug, Clone)]
pub struct JudgmentApiClient {
    http: Client,
    config: JudgmentConfig,
}

impl JudgmentApiClient {
    pub fn new(config: JudgmentConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &JudgmentConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Response> {
        let response = self
            .http
            .post(self.endpoint(path))
            .bearer_auth(&self.config.api_key)
            .header("X-Organization-Id", &self.config.organization_id)
            .json(body)
            .send()
            .await?;
        Ok(response)
    }

    /// Body shared by the status, fetch, and name-collision endpoints.
    fn run_lookup_body(&self, run: &EvaluationRun) -> Value {
        let (project_name, eval_name) = run.names();
        serde_json::json!({
            "eval_name": eval_name,
            "project_name": project_name,
            "judgment_api_key": self.config.api_key,
        })
    }

    /// Submit a run for synchronous API-scorer execution and block until
    /// the backend returns per-example results.
    pub async fn execute_api_eval(&self, run: &EvaluationRun) -> Result<Vec<ScoringResult>> {
        let payload = run.wire_payload(&self.config);
        debug!(examples = run.examples.len(), "submitting run for API evaluation");

        let response = self.post("evaluate/", &payload).await?;
        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body_text));
        }

        let body: Value = response.json().await?;
        parse_evaluate_response(body, &run.examples)
    }

    /// Enqueue a run for asynchronous background execution.
    ///
    /// Fire-and-forget: a submission failure is logged at `warn` and the
    /// caller still sees success. The async path never blocks a caller on
    /// backend availability.
    pub async fn send_to_queue(&self, run: &EvaluationRun) -> bool {
        let payload = run.wire_payload(&self.config);
        match self.post("add_to_run_eval_queue/", &payload).await {
            Ok(response) if response.status().is_success() => {
                debug!(eval_name = ?run.eval_name, "run enqueued for async evaluation");
                true
            }
            Ok(response) => {
                warn!(
                    status = %response.status(),
                    "failed to enqueue evaluation run; continuing anyway"
                );
                true
            }
            Err(error) => {
                warn!(%error, "failed to enqueue evaluation run; continuing anyway");
                true
            }
        }
    }

    /// Poll the status endpoint once.
    ///
    /// Transient failures (network errors, bad responses) are downgraded
    /// to [`EvalStatus::Unknown`] so a polling loop can keep going.
    pub async fn check_status(&self, run: &EvaluationRun) -> EvalStatusReport {
        let body = self.run_lookup_body(run);
        match self.post("check-eval-status/", &body).await {
            Ok(response) if response.status().is_success() => {
                match response.json::<EvalStatusReport>().await {
                    Ok(report) => report,
                    Err(error) => {
                        warn!(%error, "unparseable status response; treating as unknown");
                        EvalStatusReport::unknown()
                    }
                }
            }
            Ok(response) => {
                warn!(status = %response.status(), "status check failed; treating as unknown");
                EvalStatusReport::unknown()
            }
            Err(error) => {
                warn!(%error, "status check failed; treating as unknown");
                EvalStatusReport::unknown()
            }
        }
    }

    /// Fetch the stored results of a completed run.
    pub async fn fetch_results(&self, run: &EvaluationRun) -> Result<Vec<ScoringResult>> {
        let body = self.run_lookup_body(run);
        let response = self.post("fetch_eval_results/", &body).await?;
        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body_text));
        }

        let entries: Vec<FetchedResult> = response.json().await?;
        Ok(entries.into_iter().map(|entry| entry.result).collect())
    }

    /// Poll until the run completes, fails, or `max_attempts` runs out.
    ///
    /// An exhausted attempt budget is a timeout, reported distinctly from
    /// a failed run: it returns an empty result list, which callers must
    /// read as "timed out, no results" rather than "zero examples".
    pub async fn poll_until_complete(
        &self,
        run: &EvaluationRun,
        interval: Duration,
        max_attempts: u32,
    ) -> Result<Vec<ScoringResult>> {
        for attempt in 1..=max_attempts {
            let report = self.check_status(run).await;
            debug!(attempt, status = ?report.status, progress = ?report.progress, "poll");

            match report.status {
                EvalStatus::Complete => return self.fetch_results(run).await,
                EvalStatus::Failed => {
                    return Err(JudgmentError::Api {
                        status: None,
                        detail: report
                            .error
                            .or(report.message)
                            .unwrap_or_else(|| "evaluation run failed".into()),
                    });
                }
                EvalStatus::Queued | EvalStatus::Processing | EvalStatus::Unknown => {
                    tokio::time::sleep(interval).await;
                }
            }
        }

        warn!(
            max_attempts,
            eval_name = ?run.eval_name,
            "polling timed out before the run completed"
        );
        Ok(Vec::new())
    }

    /// Whether logged results already exist under this run's
    /// `(project_name, eval_name)`. The backend signals a collision with
    /// HTTP 409.
    pub async fn run_name_exists(&self, run: &EvaluationRun) -> Result<bool> {
        let body = self.run_lookup_body(run);
        let response = self.post("eval-run-name-exists/", &body).await?;
        match response.status() {
            StatusCode::CONFLICT => Ok(true),
            status if status.is_success() => Ok(false),
            status => {
                let body_text = response.text().await.unwrap_or_default();
                Err(map_http_error(status, &body_text))
            }
        }
    }

    /// Persist merged results. Returns the results-viewing URL when the
    /// backend provides one.
    pub async fn log_results(
        &self,
        run: &EvaluationRun,
        results: &[ScoringResult],
    ) -> Result<Option<String>> {
        let (project_name, eval_name) = run.names();
        let body = serde_json::json!({
            "results": results,
            "project_name": project_name,
            "eval_name": eval_name,
        });

        let response = self.post("log_eval_results/", &body).await?;
        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body_text));
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let url = body
            .get("ui_results_url")
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(url) = &url {
            info!(%url, "evaluation results logged");
        }
        Ok(url)
    }
}

/// Map a failed HTTP response to a typed API error, pulling the server's
/// `detail` message out of the body when it is JSON-shaped.
fn map_http_error(status: StatusCode, body_text: &str) -> JudgmentError {
    let detail = serde_json::from_str::<Value>(body_text)
        .ok()
        .and_then(|v| {
            v.get("detail")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body_text.to_string());
    JudgmentError::Api {
        status: Some(status.as_u16()),
        detail,
    }
}

/// Parse the `/evaluate/` response: either a bare array of entries or a
/// `{"results": [...]}` wrapper. Entries without an embedded example are
/// aligned with the run's example list by index.
fn parse_evaluate_response(body: Value, examples: &[Example]) -> Result<Vec<ScoringResult>> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(JudgmentError::Api {
                    status: None,
                    detail: "evaluate response has no 'results' array".into(),
                })
            }
        },
        other => {
            return Err(JudgmentError::Api {
                status: None,
                detail: format!("unexpected evaluate response shape: {other}"),
            })
        }
    };

    // The response must be 1:1 with the run's examples; a short or long
    // list can never be aligned back to positions.
    if entries.len() != examples.len() {
        return Err(JudgmentError::Api {
            status: None,
            detail: format!(
                "backend returned {} results for {} examples",
                entries.len(),
                examples.len()
            ),
        });
    }

    let mut results = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let entry: ApiResultEntry = serde_json::from_value(entry)?;
        let example = match entry.example {
            Some(example) => example,
            None => examples[index].clone(),
        };
        results.push(ScoringResult {
            data_object: example,
            scorers_data: entry.scorers_data,
            error: entry.error,
        });
    }
    Ok(results)
}
