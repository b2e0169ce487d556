// Scripted transports shared by the unit tests

use crate::error::ClientError;
use crate::transport::{HttpReply, HttpTransport, JudgeRequest};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

/// Replays queued replies in order and records every request
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<HttpReply, ClientError>>>,
    seen: Mutex<Vec<JudgeRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, body: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(HttpReply::new(status, body)));
        self
    }

    pub fn fail(self, err: ClientError) -> Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<JudgeRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: JudgeRequest) -> Result<HttpReply, ClientError> {
        self.seen.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Transport("script exhausted".to_string())))
    }
}

/// Answers 429 for rate-limited keys and `ok_body` for every other key
pub struct KeyedTransport {
    limited: HashSet<String>,
    ok_body: String,
    keys_used: Mutex<Vec<String>>,
}

impl KeyedTransport {
    pub fn new(limited: &[&str], ok_body: &str) -> Self {
        Self {
            limited: limited.iter().map(|k| k.to_string()).collect(),
            ok_body: ok_body.to_string(),
            keys_used: Mutex::new(Vec::new()),
        }
    }

    pub fn keys_used(&self) -> Vec<String> {
        self.keys_used.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for KeyedTransport {
    async fn send(&self, request: JudgeRequest) -> Result<HttpReply, ClientError> {
        let key = request
            .header_value(crate::client::KEY_HEADER)
            .unwrap_or_default()
            .to_string();
        self.keys_used.lock().unwrap().push(key.clone());

        if self.limited.contains(&key) {
            Ok(HttpReply::new(429, r#"{"message":"Too many requests"}"#))
        } else {
            Ok(HttpReply::new(200, self.ok_body.clone()))
        }
    }
}
