/// Judge0 Backend - batch submit and batch poll over the key-rotating client
///
/// **Critical Architectural Boundary:**
/// - Backend knows the judge's wire format and endpoints
/// - Backend does NOT poll, wait, or reduce results
/// - The orchestrator drives it through the `JudgeBackend` trait
///
/// Results are correlated back to submissions by token, never by position.

use crate::client::KeyRotatingClient;
use crate::credentials::CredentialPool;
use crate::error::{ClientError, GradingError};
use crate::transport::{HttpTransport, JudgeRequest, ReqwestTransport};
use async_trait::async_trait;
use gradeline_common::types::{JudgeResult, JudgeStatus, JudgeSubmissionRequest, JudgeToken};
use gradeline_common::Config;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

const BATCH_PATH: &str = "/submissions/batch";

/// Remote judge operations required by the orchestrator
#[async_trait]
pub trait JudgeBackend: Send + Sync {
    /// Submit one unit per test case; tokens come back in request order
    async fn submit_batch(
        &self,
        batch: &[JudgeSubmissionRequest],
    ) -> Result<Vec<JudgeToken>, GradingError>;

    /// Fetch the current result for every token, in token order
    async fn fetch_results(&self, tokens: &[JudgeToken]) -> Result<Vec<JudgeResult>, GradingError>;
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    id: u32,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct WireResult {
    token: String,
    status: Option<WireStatus>,
    stdout: Option<String>,
    stderr: Option<String>,
    compile_output: Option<String>,
    time: Option<serde_json::Value>,
    memory: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireResults {
    #[serde(default)]
    submissions: Vec<Option<WireResult>>,
}

/// Judge0 reports time as a decimal string, some deployments as a number
fn parse_seconds(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

impl WireResult {
    fn into_result(self) -> Result<JudgeResult, GradingError> {
        let status = self.status.ok_or_else(|| {
            GradingError::InvalidResponse(format!("missing status for token {}", self.token))
        })?;

        Ok(JudgeResult {
            token: JudgeToken(self.token),
            status: JudgeStatus::from(status.id),
            description: status.description,
            stdout: self.stdout,
            stderr: self.stderr,
            compile_output: self.compile_output,
            time: self.time.as_ref().and_then(parse_seconds),
            memory: self.memory,
        })
    }
}

/// Judge0 CE client
pub struct Judge0Api<T> {
    client: KeyRotatingClient<T>,
}

impl Judge0Api<ReqwestTransport> {
    /// Build the production backend: pool, transport and backoff from config
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let pool = CredentialPool::new(config.api_keys.iter().cloned())
            .with_cooldown(config.key_cooldown());
        let transport = ReqwestTransport::new(&config.judge_base_url, config.request_timeout())?;
        let client = KeyRotatingClient::new(transport, Arc::new(pool), &config.judge_host)
            .with_backoff(config.rate_limit_backoff());

        Ok(Self::new(client))
    }
}

impl<T: HttpTransport> Judge0Api<T> {
    pub fn new(client: KeyRotatingClient<T>) -> Self {
        Self { client }
    }

    pub fn credentials(&self) -> &Arc<CredentialPool> {
        self.client.pool()
    }
}

#[async_trait]
impl<T: HttpTransport> JudgeBackend for Judge0Api<T> {
    async fn submit_batch(
        &self,
        batch: &[JudgeSubmissionRequest],
    ) -> Result<Vec<JudgeToken>, GradingError> {
        if batch.is_empty() {
            return Err(GradingError::NoTestCases);
        }

        let request = JudgeRequest::post(BATCH_PATH, json!({ "submissions": batch }))
            .query("base64_encoded", "false")
            .header("Content-Type", "application/json");

        let body = self
            .client
            .execute(&request)
            .await
            .map_err(GradingError::on_submit)?;

        let entries = body.as_array().ok_or_else(|| {
            GradingError::InvalidResponse("batch submission did not return a list".to_string())
        })?;

        if entries.len() != batch.len() {
            return Err(GradingError::InvalidResponse(format!(
                "expected {} tokens, judge returned {}",
                batch.len(),
                entries.len()
            )));
        }

        // Invalid units come back as field errors instead of a token
        entries
            .iter()
            .map(|entry| {
                entry
                    .get("token")
                    .and_then(|t| t.as_str())
                    .map(|t| JudgeToken(t.to_string()))
                    .ok_or_else(|| GradingError::SubmissionRejected(entry.to_string()))
            })
            .collect()
    }

    async fn fetch_results(&self, tokens: &[JudgeToken]) -> Result<Vec<JudgeResult>, GradingError> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let joined = tokens
            .iter()
            .map(JudgeToken::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let request = JudgeRequest::get(BATCH_PATH)
            .query("tokens", joined)
            .query("base64_encoded", "false")
            .query("fields", "*");

        let body = self
            .client
            .execute(&request)
            .await
            .map_err(GradingError::on_fetch)?;

        let wire: WireResults = serde_json::from_value(body)
            .map_err(|e| GradingError::ResultFetchFailed(e.to_string()))?;

        let mut by_token: HashMap<String, WireResult> = wire
            .submissions
            .into_iter()
            .flatten()
            .map(|r| (r.token.clone(), r))
            .collect();

        tokens
            .iter()
            .map(|token| {
                by_token
                    .remove(token.as_str())
                    .ok_or_else(|| {
                        GradingError::ResultFetchFailed(format!("no result for token {}", token))
                    })
                    .and_then(WireResult::into_result)
            })
            .collect()
    }
}
