use crate::types::SubmissionRecord;
use redis::{AsyncCommands, RedisResult};
use uuid::Uuid;

/// Redis key layout for the storage collaborator
/// Keys are deterministic so the API and CLI never drift

pub const SUBMISSION_PREFIX: &str = "gradeline:submission";
pub const SOLVED_PREFIX: &str = "gradeline:solved";

/// Generate key for a stored submission
pub fn submission_key(submission_id: &Uuid) -> String {
    format!("{}:{}", SUBMISSION_PREFIX, submission_id)
}

/// Generate key for a user's solved-problem set
pub fn solved_key(user_id: &str) -> String {
    format!("{}:{}", SOLVED_PREFIX, user_id)
}

fn encode_error(e: serde_json::Error) -> redis::RedisError {
    redis::RedisError::from((redis::ErrorKind::TypeError, "serialization error", e.to_string()))
}

/// Store (or overwrite) a submission record
pub async fn store_submission(
    conn: &mut redis::aio::ConnectionManager,
    record: &SubmissionRecord,
) -> RedisResult<()> {
    let payload = serde_json::to_string(record).map_err(encode_error)?;
    conn.set(submission_key(&record.id), payload).await
}

/// Fetch a submission record
pub async fn get_submission(
    conn: &mut redis::aio::ConnectionManager,
    submission_id: &Uuid,
) -> RedisResult<Option<SubmissionRecord>> {
    let payload: Option<String> = conn.get(submission_key(submission_id)).await?;

    match payload {
        Some(data) => {
            let record = serde_json::from_str(&data).map_err(|e| {
                redis::RedisError::from((
                    redis::ErrorKind::TypeError,
                    "deserialization error",
                    e.to_string(),
                ))
            })?;
            Ok(Some(record))
        }
        None => Ok(None),
    }
}

/// Add a problem to the user's solved set
/// Returns true if it was not solved before
pub async fn mark_solved(
    conn: &mut redis::aio::ConnectionManager,
    user_id: &str,
    problem_id: &str,
) -> RedisResult<bool> {
    let added: i64 = conn.sadd(solved_key(user_id), problem_id).await?;
    Ok(added > 0)
}

/// All problems the user has solved, sorted
pub async fn solved_problems(
    conn: &mut redis::aio::ConnectionManager,
    user_id: &str,
) -> RedisResult<Vec<String>> {
    let mut solved: Vec<String> = conn.smembers(solved_key(user_id)).await?;
    solved.sort();
    Ok(solved)
}
