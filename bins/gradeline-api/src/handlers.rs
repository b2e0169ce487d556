// HTTP route handlers for the Gradeline API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use gradeline_common::redis;
use gradeline_common::types::{
    AggregateVerdict, JudgeResult, Language, ReferenceSolution, SubmissionRecord, TestCase,
};
use gradeline_grader::GradingError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::metrics;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub problem_id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub accepted: bool,
    pub submission_id: Uuid,
    pub status: String,
    pub total_test_cases: usize,
    pub passed_test_cases: usize,
    pub runtime: f64,
    pub memory: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default, alias = "referenceSolution")]
    pub reference_solution: Vec<ReferenceSolution>,
    #[serde(default, alias = "visibleTestCases")]
    pub visible_test_cases: Vec<TestCase>,
}

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub name: String,
    pub id: u32,
}

fn require(fields: &[&str]) -> Result<(), AppError> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(AppError::MissingFields);
    }
    Ok(())
}

/// Only a full pass counts toward the user's solved set
fn solves_problem(verdict: &AggregateVerdict) -> bool {
    verdict.is_accepted() && verdict.total > 0 && verdict.passed == verdict.total
}

/// POST /submissions - Grade a solution against hidden test cases
pub async fn submit_solution(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitRequest>,
) -> Result<impl IntoResponse, AppError> {
    require(&[
        payload.user_id.as_str(),
        payload.problem_id.as_str(),
        payload.code.as_str(),
        payload.language.as_str(),
    ])?;

    let language = Language::from_name(&payload.language)
        .ok_or_else(|| GradingError::UnsupportedLanguage(payload.language.clone()))?;
    if payload.test_cases.is_empty() {
        return Err(GradingError::NoTestCases.into());
    }

    // Stored as pending before any judge call
    let mut record = SubmissionRecord::pending(
        &payload.user_id,
        &payload.problem_id,
        language,
        &payload.code,
        payload.test_cases.len(),
    );
    let mut conn = state.redis.clone();
    redis::store_submission(&mut conn, &record).await?;

    let started = Instant::now();
    let graded = state
        .grader
        .grade_submission(&payload.code, &payload.language, &payload.test_cases)
        .await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    metrics::update_credentials_exhausted(state.grader.backend().credentials().exhausted_count());

    let verdict = match graded {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!(
                submission_id = %record.id,
                error = %e,
                retryable = e.is_retryable(),
                "Grading failed"
            );
            record.mark_failed(&e.to_string());
            redis::store_submission(&mut conn, &record).await?;
            metrics::record_grading(&language.to_string(), "failed", elapsed_ms);
            return Err(e.into());
        }
    };

    record.apply_verdict(&verdict);
    redis::store_submission(&mut conn, &record).await?;
    metrics::record_grading(&language.to_string(), &verdict.status.to_string(), elapsed_ms);

    if solves_problem(&verdict) {
        let first_solve =
            redis::mark_solved(&mut conn, &payload.user_id, &payload.problem_id).await?;
        if first_solve {
            info!(
                user_id = %payload.user_id,
                problem_id = %payload.problem_id,
                "Problem solved for the first time"
            );
        }
    }

    info!(
        submission_id = %record.id,
        language = %language,
        status = %verdict.status,
        passed = verdict.passed,
        total = verdict.total,
        "Submission graded"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            accepted: verdict.is_accepted(),
            submission_id: record.id,
            status: verdict.status.to_string(),
            total_test_cases: verdict.total,
            passed_test_cases: verdict.passed,
            runtime: verdict.runtime,
            memory: verdict.memory,
            error_message: verdict.error_message,
        }),
    ))
}

/// POST /run - Run against visible test cases, raw results, nothing persisted
pub async fn run_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RunRequest>,
) -> Result<(StatusCode, Json<Vec<JudgeResult>>), AppError> {
    require(&[payload.code.as_str(), payload.language.as_str()])?;

    let results = state
        .grader
        .run_sample(&payload.code, &payload.language, &payload.test_cases)
        .await?;
    metrics::record_sample_run(&payload.language.to_lowercase());

    info!(
        language = %payload.language,
        cases = results.len(),
        "Sample run complete"
    );

    Ok((StatusCode::CREATED, Json(results)))
}

/// POST /reference/validate - Check reference solutions before a problem is saved
pub async fn validate_reference(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ValidateRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.reference_solution.is_empty() || payload.visible_test_cases.is_empty() {
        return Err(AppError::MissingFields);
    }

    let outcome = state
        .grader
        .validate_reference(&payload.reference_solution, &payload.visible_test_cases)
        .await;

    match outcome {
        Ok(()) => {
            metrics::record_reference_validation("accepted");
            Ok((
                StatusCode::OK,
                Json(serde_json::json!({
                    "message": "Reference solutions passed all visible test cases",
                    "success": true
                })),
            ))
        }
        Err(e) => {
            metrics::record_reference_validation("rejected");
            Err(e.into())
        }
    }
}

/// GET /submissions/{id} - Stored submission record
pub async fn get_submission(
    State(state): State<Arc<AppState>>,
    Path(submission_id): Path<String>,
) -> Result<Json<SubmissionRecord>, AppError> {
    let id = Uuid::parse_str(&submission_id).map_err(|_| AppError::InvalidId)?;

    let mut conn = state.redis.clone();
    redis::get_submission(&mut conn, &id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

/// GET /users/{user_id}/solved - Problems the user has solved
pub async fn solved_problems(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state.redis.clone();
    let solved = redis::solved_problems(&mut conn, &user_id).await?;

    Ok(Json(serde_json::json!({
        "user_id": user_id,
        "solved": solved
    })))
}

/// GET /languages - Supported languages and their judge ids
pub async fn list_languages() -> Json<Vec<LanguageInfo>> {
    Json(
        Language::all_variants()
            .iter()
            .map(|lang| LanguageInfo {
                name: lang.to_string(),
                id: lang.judge_id(),
            })
            .collect(),
    )
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let credentials = state.grader.backend().credentials();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "uptime_secs": state.start_time.elapsed().as_secs(),
            "credentials": credentials.len(),
            "credentials_exhausted": credentials.exhausted_count()
        })),
    )
}

/// GET /metrics - Prometheus exposition
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    metrics::update_credentials_exhausted(state.grader.backend().credentials().exhausted_count());
    (StatusCode::OK, metrics::render_metrics())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradeline_common::types::VerdictStatus;

    #[test]
    fn test_require_rejects_blank_fields() {
        assert!(require(&["a", "b"]).is_ok());
        assert!(matches!(require(&["a", ""]), Err(AppError::MissingFields)));
        assert!(matches!(require(&["  "]), Err(AppError::MissingFields)));
    }

    fn verdict(status: VerdictStatus, passed: usize, total: usize) -> AggregateVerdict {
        AggregateVerdict {
            total,
            passed,
            status,
            runtime: 0.0,
            memory: 0,
            error_message: None,
        }
    }

    #[test]
    fn test_only_accepted_verdicts_solve_the_problem() {
        assert!(solves_problem(&verdict(VerdictStatus::Accepted, 3, 3)));
        assert!(!solves_problem(&verdict(VerdictStatus::Wrong, 2, 3)));
        assert!(!solves_problem(&verdict(VerdictStatus::Error, 0, 3)));
        // Error on the last case after earlier passes is still no credit
        assert!(!solves_problem(&verdict(VerdictStatus::Error, 2, 3)));
    }

    #[test]
    fn test_submit_request_defaults_missing_fields() {
        let payload: SubmitRequest =
            serde_json::from_str(r#"{"code":"print(1)","language":"python"}"#).unwrap();
        assert!(payload.user_id.is_empty());
        assert!(payload.test_cases.is_empty());
    }

    #[test]
    fn test_validate_request_accepts_camel_case() {
        let payload: ValidateRequest = serde_json::from_str(
            r#"{
                "referenceSolution": [{"language": "cpp", "completeCode": "int main(){}"}],
                "visibleTestCases": [{"input": "1", "output": "1"}]
            }"#,
        )
        .unwrap();
        assert_eq!(payload.reference_solution[0].language, "cpp");
        assert_eq!(payload.visible_test_cases[0].expected_output, "1");
    }

    #[tokio::test]
    async fn test_list_languages() {
        let Json(languages) = list_languages().await;
        assert_eq!(languages.len(), 5);
        assert!(languages.iter().any(|l| l.name == "python" && l.id == 71));
        assert!(languages.iter().any(|l| l.name == "cpp" && l.id == 54));
    }
}
