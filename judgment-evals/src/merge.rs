//! Reconciliation of API-path and local-path result lists.

use tracing::warn;

use judgment_core::error::{JudgmentError, Result};
use judgment_core::result::ScoringResult;

/// Merge per-example results from the API and local paths into one aligned
/// sequence.
///
/// Both lists must be 1:1 with the run's example list. An empty side passes
/// the other through unchanged; otherwise a length mismatch or an identity
/// mismatch at any index is a programming error and fails immediately —
/// never downgraded by `ignore_errors`.
pub fn merge_results(
    api_results: Vec<ScoringResult>,
    local_results: Vec<ScoringResult>,
) -> Result<Vec<ScoringResult>> {
    if api_results.is_empty() {
        return Ok(local_results);
    }
    if local_results.is_empty() {
        return Ok(api_results);
    }

    if api_results.len() != local_results.len() {
        return Err(JudgmentError::alignment(format!(
            "API and local result counts differ: {} vs {}",
            api_results.len(),
            local_results.len()
        )));
    }

    let mut merged = Vec::with_capacity(api_results.len());
    for (index, (mut api, local)) in api_results
        .into_iter()
        .zip(local_results.into_iter())
        .enumerate()
    {
        let a = &api.data_object;
        let b = &local.data_object;
        if a.input != b.input
            || a.actual_output != b.actual_output
            || a.expected_output != b.expected_output
        {
            return Err(JudgmentError::alignment(format!(
                "API and local results at index {index} refer to different examples"
            )));
        }

        // API entries first, then local, inside the API result object.
        api.scorers_data.extend(local.scorers_data);
        if api.error.is_none() {
            api.error = local.error;
        }
        merged.push(api);
    }
    Ok(merged)
}

/// Pass-through diagnostics: warn about every result that came back with
/// no scorer data at all. The example most likely lacks fields the
/// configured scorers require. Never mutates or drops results.
pub fn check_missing_scorer_data(results: Vec<ScoringResult>) -> Vec<ScoringResult> {
    for (index, result) in results.iter().enumerate() {
        if result.scorers_data.is_empty() {
            warn!(
                example_index = result.data_object.example_index.unwrap_or(index),
                "result has no scorer data; the example is likely missing fields \
                 required by the configured scorers"
            );
        }
    }
    results
}
