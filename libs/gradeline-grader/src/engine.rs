/// Grading Engine - Orchestrates One Grading Attempt
///
/// **Core Responsibility:**
/// Turn (source, language, test cases) into judge results or a verdict.
///
/// **State Machine (per call, never persisted):**
/// - Submitting → batch-submit one unit per test case
/// - Polling    → fetch every token until all are terminal, bounded by `PollPolicy`
/// - Reducing   → hand terminal results to the evaluator
/// - Failed     → surface the error, no partial verdict
///
/// **Critical Architectural Boundary:**
/// - Engine does NOT know the judge's wire format (see `JudgeBackend`)
/// - Engine does NOT know reduction rules (see `evaluator`)
/// - Engine does NOT mark problems solved; callers act on `accepted`

use crate::error::GradingError;
use crate::evaluator;
use crate::judge0::JudgeBackend;
use gradeline_common::types::{
    AggregateVerdict, JudgeResult, JudgeSubmissionRequest, JudgeToken, Language,
    ReferenceSolution, TestCase,
};
use gradeline_common::Config;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Polling bounds for one grading attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.poll_interval(),
            max_attempts: config.max_poll_attempts,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

/// Resolve the language and reject empty case sets before any judge call
fn prepare(language_name: &str, test_cases: &[TestCase]) -> Result<Language, GradingError> {
    let language = Language::from_name(language_name)
        .ok_or_else(|| GradingError::UnsupportedLanguage(language_name.to_string()))?;

    if test_cases.is_empty() {
        return Err(GradingError::NoTestCases);
    }

    Ok(language)
}

pub struct Grader<B> {
    backend: B,
    poll: PollPolicy,
}

impl<B: JudgeBackend> Grader<B> {
    pub fn new(backend: B, poll: PollPolicy) -> Self {
        Self { backend, poll }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Grade a submission against hidden test cases
    #[instrument(skip(self, source_code, test_cases), fields(cases = test_cases.len()))]
    pub async fn grade_submission(
        &self,
        source_code: &str,
        language_name: &str,
        test_cases: &[TestCase],
    ) -> Result<AggregateVerdict, GradingError> {
        let language = prepare(language_name, test_cases)?;
        let results = self.judge(source_code, language, test_cases).await?;
        let verdict = evaluator::reduce(&results);

        info!(
            language = %language,
            status = %verdict.status,
            passed = verdict.passed,
            total = verdict.total,
            "Grading complete"
        );

        Ok(verdict)
    }

    /// Run against visible test cases and return raw per-case results
    #[instrument(skip(self, source_code, test_cases), fields(cases = test_cases.len()))]
    pub async fn run_sample(
        &self,
        source_code: &str,
        language_name: &str,
        test_cases: &[TestCase],
    ) -> Result<Vec<JudgeResult>, GradingError> {
        let language = prepare(language_name, test_cases)?;
        self.judge(source_code, language, test_cases).await
    }

    /// Check every reference solution against the visible cases
    ///
    /// Stops at the first solution that does not pass every case.
    #[instrument(skip_all, fields(solutions = solutions.len(), cases = test_cases.len()))]
    pub async fn validate_reference(
        &self,
        solutions: &[ReferenceSolution],
        test_cases: &[TestCase],
    ) -> Result<(), GradingError> {
        for solution in solutions {
            let language = prepare(&solution.language, test_cases)?;
            let results = self
                .judge(&solution.complete_code, language, test_cases)
                .await?;

            evaluator::check_reference(&results).map_err(|reason| {
                GradingError::ReferenceRejected {
                    language: language.to_string(),
                    reason,
                }
            })?;

            info!(language = %language, "Reference solution accepted");
        }

        Ok(())
    }

    /// Submitting → Polling
    async fn judge(
        &self,
        source_code: &str,
        language: Language,
        test_cases: &[TestCase],
    ) -> Result<Vec<JudgeResult>, GradingError> {
        let batch = JudgeSubmissionRequest::batch(source_code, language, test_cases);
        let tokens = self.backend.submit_batch(&batch).await?;

        if tokens.len() != test_cases.len() {
            return Err(GradingError::InvalidResponse(format!(
                "expected {} tokens, judge returned {}",
                test_cases.len(),
                tokens.len()
            )));
        }

        debug!(language = %language, tokens = tokens.len(), "Batch submitted");

        let results = self.poll(&tokens).await?;
        if results.len() != tokens.len() {
            return Err(GradingError::InvalidResponse(format!(
                "expected {} results, judge returned {}",
                tokens.len(),
                results.len()
            )));
        }

        Ok(results)
    }

    async fn poll(&self, tokens: &[JudgeToken]) -> Result<Vec<JudgeResult>, GradingError> {
        let max_attempts = self.poll.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let results = self.backend.fetch_results(tokens).await?;
            let pending = results.iter().filter(|r| !r.status.is_terminal()).count();

            if pending == 0 {
                debug!(attempt, "All results terminal");
                return Ok(results);
            }

            if attempt >= max_attempts {
                warn!(attempt, pending, "Judging did not finish in time");
                return Err(GradingError::JudgingTimedOut { attempts: attempt });
            }

            debug!(attempt, pending, "Results pending, polling again");
            tokio::time::sleep(self.poll.interval).await;
        }
    }
}
