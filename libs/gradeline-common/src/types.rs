use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Strongly-typed language enum
/// Closed set - the judge only knows these runtimes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
    Java,
    JavaScript,
    Python,
}

impl Language {
    /// Returns all language variants
    /// This is the single source of truth for available languages
    pub fn all_variants() -> &'static [Language] {
        &[
            Language::C,
            Language::Cpp,
            Language::Java,
            Language::JavaScript,
            Language::Python,
        ]
    }

    /// Parse a language from its name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Language> {
        match name.to_lowercase().as_str() {
            "c" => Some(Language::C),
            "cpp" => Some(Language::Cpp),
            "java" => Some(Language::Java),
            "javascript" => Some(Language::JavaScript),
            "python" => Some(Language::Python),
            _ => None,
        }
    }

    /// Upstream judge language identifier
    pub fn judge_id(&self) -> u32 {
        match self {
            Language::C => 50,
            Language::Cpp => 54,
            Language::Java => 62,
            Language::JavaScript => 63,
            Language::Python => 71,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::C => write!(f, "c"),
            Language::Cpp => write!(f, "cpp"),
            Language::Java => write!(f, "java"),
            Language::JavaScript => write!(f, "javascript"),
            Language::Python => write!(f, "python"),
        }
    }
}

/// Resolve a language name to the judge's numeric id
/// Used by validation flows to reject unsupported languages before contacting the judge
pub fn resolve_language_id(name: &str) -> Option<u32> {
    Language::from_name(name).map(|lang| lang.judge_id())
}

/// Test Case Definition (Immutable Input)
/// Ordering matters - results are reported in the same order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    #[serde(alias = "output")]
    pub expected_output: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// One unit of work sent to the judge
/// A batch holds one of these per test case, all sharing source and language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeSubmissionRequest {
    pub source_code: String,
    pub language_id: u32,
    pub stdin: String,
    pub expected_output: String,
}

impl JudgeSubmissionRequest {
    /// Build one request per test case, preserving case order
    pub fn batch(source_code: &str, language: Language, test_cases: &[TestCase]) -> Vec<Self> {
        test_cases
            .iter()
            .map(|tc| JudgeSubmissionRequest {
                source_code: source_code.to_string(),
                language_id: language.judge_id(),
                stdin: tc.input.clone(),
                expected_output: tc.expected_output.clone(),
            })
            .collect()
    }
}

/// Opaque handle returned by the judge for one submitted unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JudgeToken(pub String);

impl JudgeToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JudgeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Judge status, keyed by the upstream numeric id
/// Serialized as the raw id so clients see the judge's convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum JudgeStatus {
    InQueue,
    Processing,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    CompilationError,
    RuntimeError,
    Other(u32),
}

impl JudgeStatus {
    pub fn id(&self) -> u32 {
        match self {
            JudgeStatus::InQueue => 1,
            JudgeStatus::Processing => 2,
            JudgeStatus::Accepted => 3,
            JudgeStatus::WrongAnswer => 4,
            JudgeStatus::TimeLimitExceeded => 5,
            JudgeStatus::CompilationError => 6,
            JudgeStatus::RuntimeError => 7,
            JudgeStatus::Other(id) => *id,
        }
    }

    /// Terminal statuses never change on further polling
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JudgeStatus::InQueue | JudgeStatus::Processing)
    }
}

impl From<u32> for JudgeStatus {
    fn from(id: u32) -> Self {
        match id {
            1 => JudgeStatus::InQueue,
            2 => JudgeStatus::Processing,
            3 => JudgeStatus::Accepted,
            4 => JudgeStatus::WrongAnswer,
            5 => JudgeStatus::TimeLimitExceeded,
            6 => JudgeStatus::CompilationError,
            7 => JudgeStatus::RuntimeError,
            other => JudgeStatus::Other(other),
        }
    }
}

impl From<JudgeStatus> for u32 {
    fn from(status: JudgeStatus) -> Self {
        status.id()
    }
}

/// Per-token outcome reported by the judge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeResult {
    pub token: JudgeToken,
    #[serde(rename = "status_id")]
    pub status: JudgeStatus,
    pub description: String,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
    /// Wall time in seconds
    pub time: Option<f64>,
    /// Peak memory in KB
    pub memory: Option<u64>,
}

impl JudgeResult {
    /// First non-empty diagnostic: compiler output wins over stderr
    pub fn diagnostic(&self) -> Option<&str> {
        [self.compile_output.as_deref(), self.stderr.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
    }
}

/// Overall verdict category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Accepted,
    Wrong,
    Error,
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerdictStatus::Accepted => write!(f, "accepted"),
            VerdictStatus::Wrong => write!(f, "wrong"),
            VerdictStatus::Error => write!(f, "error"),
        }
    }
}

/// Aggregate Verdict
/// Reduction of every judge result for one grading attempt
///
/// ## Semantics:
/// - passed <= total, total == number of test cases
/// - status is Accepted iff passed == total
/// - runtime: seconds summed over passed cases
/// - memory: peak KB over all cases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateVerdict {
    pub total: usize,
    pub passed: usize,
    pub status: VerdictStatus,
    pub runtime: f64,
    pub memory: u64,
    pub error_message: Option<String>,
}

impl AggregateVerdict {
    pub fn is_accepted(&self) -> bool {
        self.status == VerdictStatus::Accepted
    }
}

/// Reference solution attached to a problem, one per language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSolution {
    pub language: String,
    #[serde(alias = "completeCode")]
    pub complete_code: String,
}

/// Persisted submission lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionState {
    Pending,
    Accepted,
    Wrong,
    Error,
}

impl From<VerdictStatus> for SubmissionState {
    fn from(status: VerdictStatus) -> Self {
        match status {
            VerdictStatus::Accepted => SubmissionState::Accepted,
            VerdictStatus::Wrong => SubmissionState::Wrong,
            VerdictStatus::Error => SubmissionState::Error,
        }
    }
}

/// Submission record handed to the storage collaborator
/// Written as Pending before judging so a judge outage never loses the code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub user_id: String,
    pub problem_id: String,
    pub language: Language,
    pub code: String,
    pub state: SubmissionState,
    pub test_cases_total: usize,
    pub test_cases_passed: usize,
    pub runtime: f64,
    pub memory: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubmissionRecord {
    pub fn pending(
        user_id: &str,
        problem_id: &str,
        language: Language,
        code: &str,
        test_cases_total: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            problem_id: problem_id.to_string(),
            language,
            code: code.to_string(),
            state: SubmissionState::Pending,
            test_cases_total,
            test_cases_passed: 0,
            runtime: 0.0,
            memory: 0,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_verdict(&mut self, verdict: &AggregateVerdict) {
        self.state = verdict.status.into();
        self.test_cases_total = verdict.total;
        self.test_cases_passed = verdict.passed;
        self.runtime = verdict.runtime;
        self.memory = verdict.memory;
        self.error_message = verdict.error_message.clone();
        self.updated_at = Utc::now();
    }

    /// Grading never produced a verdict
    pub fn mark_failed(&mut self, reason: &str) {
        self.state = SubmissionState::Error;
        self.error_message = Some(reason.to_string());
        self.updated_at = Utc::now();
    }
}
