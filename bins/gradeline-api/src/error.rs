use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use gradeline_grader::GradingError;
use thiserror::Error;
use tracing::warn;

use crate::metrics;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Some Fields are Missing")]
    MissingFields,

    #[error("Invalid submission ID")]
    InvalidId,

    #[error("Submission not found")]
    NotFound,

    #[error(transparent)]
    Grading(#[from] GradingError),

    #[error("Storage error: {0}")]
    Storage(#[from] redis::RedisError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingFields | AppError::InvalidId => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Grading(err) => match err {
                GradingError::UnsupportedLanguage(_)
                | GradingError::NoTestCases
                | GradingError::ReferenceRejected { .. } => StatusCode::BAD_REQUEST,
                GradingError::AllCredentialsExhausted => StatusCode::SERVICE_UNAVAILABLE,
                GradingError::JudgingTimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
                GradingError::SubmissionRejected(_)
                | GradingError::ResultFetchFailed(_)
                | GradingError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            },
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metric label
    pub fn reason(&self) -> &'static str {
        match self {
            AppError::MissingFields => "missing_fields",
            AppError::InvalidId => "invalid_id",
            AppError::NotFound => "not_found",
            AppError::Grading(err) => match err {
                GradingError::UnsupportedLanguage(_) => "unsupported_language",
                GradingError::NoTestCases => "no_test_cases",
                GradingError::AllCredentialsExhausted => "credentials_exhausted",
                GradingError::SubmissionRejected(_) => "submission_rejected",
                GradingError::ResultFetchFailed(_) => "result_fetch_failed",
                GradingError::JudgingTimedOut { .. } => "judging_timed_out",
                GradingError::InvalidResponse(_) => "invalid_response",
                GradingError::ReferenceRejected { .. } => "reference_rejected",
            },
            AppError::Storage(_) => "storage",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        metrics::record_request_rejected(self.reason());

        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "Request failed");
        }

        (
            status,
            Json(serde_json::json!({
                "message": self.to_string(),
                "success": false
            })),
        )
            .into_response()
    }
}
