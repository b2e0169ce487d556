pub mod types;
pub mod redis;
pub mod config;

// Re-export commonly used types for convenience
pub use types::{
    resolve_language_id, AggregateVerdict, JudgeResult, JudgeStatus, JudgeSubmissionRequest,
    JudgeToken, Language, ReferenceSolution, TestCase, VerdictStatus,
};
pub use config::Config;
