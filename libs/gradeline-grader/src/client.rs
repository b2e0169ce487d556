/// Key-Rotating Client - Judge Calls with Rate-Limit Failover
///
/// **Core Responsibility:**
/// Execute a judge request while hiding per-key rate limiting from callers.
///
/// **Retry Policy:**
/// - HTTP 429: mark the key exhausted, rotate, back off, retry
/// - At most one attempt per key in the pool
/// - Anything else (network, 4xx, 5xx, malformed body) fails fast

use crate::credentials::CredentialPool;
use crate::error::ClientError;
use crate::transport::{HttpTransport, JudgeRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const RATE_LIMITED: u16 = 429;
pub const KEY_HEADER: &str = "x-rapidapi-key";
pub const HOST_HEADER: &str = "x-rapidapi-host";

pub struct KeyRotatingClient<T> {
    transport: T,
    pool: Arc<CredentialPool>,
    host: String,
    backoff: Duration,
}

impl<T: HttpTransport> KeyRotatingClient<T> {
    pub fn new(transport: T, pool: Arc<CredentialPool>, host: &str) -> Self {
        Self {
            transport,
            pool,
            host: host.to_string(),
            backoff: Duration::from_secs(1),
        }
    }

    /// Wait applied after each rate-limited attempt
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn pool(&self) -> &Arc<CredentialPool> {
        &self.pool
    }

    /// Execute `request` with the current credential, rotating on 429
    pub async fn execute(&self, request: &JudgeRequest) -> Result<serde_json::Value, ClientError> {
        let max_attempts = self.pool.len();

        for attempt in 1..=max_attempts {
            let credential = self
                .pool
                .current()
                .ok_or(ClientError::AllCredentialsExhausted)?;

            let prepared = request
                .clone()
                .header(KEY_HEADER, credential.key.as_str())
                .header(HOST_HEADER, self.host.as_str());

            debug!(
                path = %request.path,
                key_index = credential.index + 1,
                attempt,
                "Calling judge"
            );

            let reply = self.transport.send(prepared).await?;

            if reply.status == RATE_LIMITED {
                warn!(
                    key_index = credential.index + 1,
                    attempt,
                    max_attempts,
                    "Rate limit exceeded, rotating to next key"
                );
                self.pool.mark_exhausted(credential.index);
                if attempt == max_attempts || self.pool.current().is_none() {
                    break;
                }
                tokio::time::sleep(self.backoff).await;
                continue;
            }

            if !reply.is_success() {
                return Err(ClientError::Status {
                    status: reply.status,
                    body: reply.body,
                });
            }

            return serde_json::from_str(&reply.body)
                .map_err(|e| ClientError::Decode(e.to_string()));
        }

        Err(ClientError::AllCredentialsExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{KeyedTransport, ScriptedTransport};
    use serde_json::json;

    fn pool(keys: &[&str]) -> Arc<CredentialPool> {
        Arc::new(CredentialPool::new(keys.iter().map(|k| k.to_string())))
    }

    fn client<T: HttpTransport>(transport: T, keys: &[&str]) -> KeyRotatingClient<T> {
        KeyRotatingClient::new(transport, pool(keys), "judge.example.com")
    }

    #[tokio::test]
    async fn test_success_returns_parsed_body() {
        let transport = Arc::new(ScriptedTransport::new().reply(200, r#"{"ok":true}"#));
        let client = client(transport.clone(), &["k1"]);

        let body = client.execute(&JudgeRequest::get("/about")).await.unwrap();

        assert_eq!(body, json!({"ok": true}));
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header_value(KEY_HEADER), Some("k1"));
        assert_eq!(sent[0].header_value(HOST_HEADER), Some("judge.example.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotates_until_last_key_succeeds() {
        let keys = ["k1", "k2", "k3", "k4"];
        let transport = Arc::new(KeyedTransport::new(&["k1", "k2", "k3"], "[]"));
        let client = client(transport.clone(), &keys);

        let body = client.execute(&JudgeRequest::get("/x")).await.unwrap();

        assert_eq!(body, json!([]));
        assert_eq!(transport.keys_used(), vec!["k1", "k2", "k3", "k4"]);
        assert_eq!(client.pool().exhausted_count(), 3);
        assert_eq!(client.pool().cursor(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_keys_rate_limited() {
        let keys = ["k1", "k2", "k3"];
        let transport = Arc::new(KeyedTransport::new(&keys, "{}"));
        let client = client(transport.clone(), &keys);

        let err = client.execute(&JudgeRequest::get("/x")).await.unwrap_err();

        assert_eq!(err, ClientError::AllCredentialsExhausted);
        assert_eq!(transport.keys_used().len(), 3);
        assert_eq!(client.pool().exhausted_count(), 3);

        // Exhaustion persists: the next call fails without touching the wire
        let err = client.execute(&JudgeRequest::get("/x")).await.unwrap_err();
        assert_eq!(err, ClientError::AllCredentialsExhausted);
        assert_eq!(transport.keys_used().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_waits_between_attempts() {
        let transport = ScriptedTransport::new()
            .reply(429, "")
            .reply(200, "{}");
        let client = client(transport, &["k1", "k2"]).with_backoff(Duration::from_secs(1));

        let started = tokio::time::Instant::now();
        client.execute(&JudgeRequest::get("/x")).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_backoff_once_every_key_is_exhausted() {
        let keys = ["k1", "k2"];
        let client = client(KeyedTransport::new(&keys, "{}"), &keys)
            .with_backoff(Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        let err = client.execute(&JudgeRequest::get("/x")).await.unwrap_err();

        assert_eq!(err, ClientError::AllCredentialsExhausted);
        // One wait between k1 and k2, none after k2
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_share_rotation() {
        let transport = Arc::new(KeyedTransport::new(&["k1"], "{}"));
        let client = Arc::new(
            client(transport.clone(), &["k1", "k2"]).with_backoff(Duration::from_secs(1)),
        );

        let started = tokio::time::Instant::now();
        let first = JudgeRequest::get("/a");
        let second = JudgeRequest::get("/b");
        let (a, b) = tokio::join!(client.execute(&first), client.execute(&second));

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(client.pool().exhausted_count(), 1);
        assert_eq!(client.pool().cursor(), 1);

        // Both backoffs overlap instead of queueing
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_server_error_fails_fast() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(503, "upstream down")
                .reply(200, "{}"),
        );
        let client = client(transport.clone(), &["k1", "k2"]);

        let err = client.execute(&JudgeRequest::get("/x")).await.unwrap_err();

        assert_eq!(
            err,
            ClientError::Status {
                status: 503,
                body: "upstream down".to_string()
            }
        );
        assert_eq!(transport.calls(), 1);
        assert_eq!(client.pool().exhausted_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_error_fails_fast() {
        let transport = Arc::new(
            ScriptedTransport::new().fail(ClientError::Transport("connection refused".to_string())),
        );
        let client = client(transport.clone(), &["k1", "k2"]);

        let err = client.execute(&JudgeRequest::get("/x")).await.unwrap_err();

        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let client = client(ScriptedTransport::new().reply(200, "<html>"), &["k1"]);

        let err = client.execute(&JudgeRequest::get("/x")).await.unwrap_err();

        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_empty_pool_is_exhausted() {
        let transport = Arc::new(ScriptedTransport::new().reply(200, "{}"));
        let client = client(transport.clone(), &[]);

        let err = client.execute(&JudgeRequest::get("/x")).await.unwrap_err();

        assert_eq!(err, ClientError::AllCredentialsExhausted);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotation_state_shared_across_calls() {
        let transport = Arc::new(KeyedTransport::new(&["k1"], "{}"));
        let client = client(transport.clone(), &["k1", "k2"]);

        client.execute(&JudgeRequest::get("/x")).await.unwrap();
        client.execute(&JudgeRequest::get("/y")).await.unwrap();

        assert_eq!(transport.keys_used(), vec!["k1", "k2", "k2"]);
    }
}
