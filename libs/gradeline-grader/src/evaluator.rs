/// Verdict Evaluator - Judge-Agnostic Reduction Logic
///
/// **Core Responsibility:**
/// Reduce per-test-case judge results into one aggregate verdict.
///
/// **Critical Properties:**
/// - Knows nothing about HTTP, credentials or polling
/// - Pure function: (judge results) → verdict
///
/// **Reduction Rules:**
/// - Every result is visited, failures never stop the walk
/// - passed counts accepted cases, runtime sums their times
/// - memory is the peak over all cases
/// - status is the category of the first non-accepted case
/// - error_message is the first failing case's diagnostic

use gradeline_common::types::{AggregateVerdict, JudgeResult, JudgeStatus, VerdictStatus};
use tracing::debug;

/// Verdict category of a single result; None when accepted
pub fn categorize(status: JudgeStatus) -> Option<VerdictStatus> {
    match status {
        JudgeStatus::Accepted => None,
        JudgeStatus::WrongAnswer => Some(VerdictStatus::Wrong),
        _ => Some(VerdictStatus::Error),
    }
}

/// Reduce results (already in submitted order) into a verdict
pub fn reduce(results: &[JudgeResult]) -> AggregateVerdict {
    let mut passed = 0usize;
    let mut runtime = 0.0f64;
    let mut memory = 0u64;
    let mut failure: Option<(VerdictStatus, Option<String>)> = None;

    for (idx, result) in results.iter().enumerate() {
        memory = memory.max(result.memory.unwrap_or(0));

        match categorize(result.status) {
            None => {
                passed += 1;
                runtime += result.time.unwrap_or(0.0);
            }
            Some(category) => {
                debug!(
                    case = idx + 1,
                    status = result.status.id(),
                    description = %result.description,
                    "Test case failed"
                );
                if failure.is_none() {
                    failure = Some((category, result.diagnostic().map(str::to_string)));
                }
            }
        }
    }

    let (status, error_message) = failure.unwrap_or((VerdictStatus::Accepted, None));

    AggregateVerdict {
        total: results.len(),
        passed,
        status,
        runtime,
        memory,
        error_message,
    }
}

/// Check a reference solution's results, case by case
///
/// Returns the reason for the first non-accepted case.
pub fn check_reference(results: &[JudgeResult]) -> Result<(), String> {
    for result in results {
        let reason = match result.status {
            JudgeStatus::Accepted => continue,
            JudgeStatus::InQueue | JudgeStatus::Processing => {
                format!("Solution is {}", result.description.to_lowercase())
            }
            JudgeStatus::WrongAnswer => "Wrong answer on test case".to_string(),
            JudgeStatus::TimeLimitExceeded => "Time limit exceeded".to_string(),
            JudgeStatus::CompilationError => {
                format!("Compilation error: {}", result.diagnostic().unwrap_or_default())
            }
            JudgeStatus::RuntimeError => format!(
                "Runtime error: {}",
                result.stderr.as_deref().unwrap_or_default()
            ),
            JudgeStatus::Other(_) => format!("Unexpected result: {}", result.description),
        };
        return Err(reason);
    }

    Ok(())
}
