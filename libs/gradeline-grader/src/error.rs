use thiserror::Error;

/// Failures of a single judge call through the key-rotating client
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("All judge API keys have exceeded their rate limits")]
    AllCredentialsExhausted,

    #[error("Judge request failed: {0}")]
    Transport(String),

    #[error("Judge responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed judge response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Upstream detail suitable for surfacing to callers
    pub fn detail(&self) -> String {
        match self {
            ClientError::Status { body, .. } => upstream_message(body),
            other => other.to_string(),
        }
    }
}

/// Judge0 reports rejections as `{"error": "..."}`; fall back to the raw body
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// Grading taxonomy surfaced to API and CLI callers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradingError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("At least one test case is required")]
    NoTestCases,

    #[error("All judge API keys have exceeded their rate limits, try again later")]
    AllCredentialsExhausted,

    #[error("Judge rejected the submission: {0}")]
    SubmissionRejected(String),

    #[error("Failed to fetch submission results: {0}")]
    ResultFetchFailed(String),

    #[error("Judging did not finish after {attempts} polls")]
    JudgingTimedOut { attempts: u32 },

    #[error("Invalid response from judge: {0}")]
    InvalidResponse(String),

    #[error("Reference solution for {language} rejected: {reason}")]
    ReferenceRejected { language: String, reason: String },
}

impl GradingError {
    /// Batch-submit failure; exhaustion keeps its own class
    pub fn on_submit(err: ClientError) -> Self {
        match err {
            ClientError::AllCredentialsExhausted => GradingError::AllCredentialsExhausted,
            other => GradingError::SubmissionRejected(other.detail()),
        }
    }

    /// Result-poll failure; exhaustion keeps its own class
    pub fn on_fetch(err: ClientError) -> Self {
        match err {
            ClientError::AllCredentialsExhausted => GradingError::AllCredentialsExhausted,
            other => GradingError::ResultFetchFailed(other.detail()),
        }
    }

    /// Whether the same request may succeed later without changes
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GradingError::AllCredentialsExhausted | GradingError::JudgingTimedOut { .. }
        )
    }
}
