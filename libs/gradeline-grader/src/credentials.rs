/// Credential Pool - Rotating API Keys for the Upstream Judge
///
/// Holds the ordered key list plus the only shared mutable state in the
/// grading core: the current-key cursor and the set of rate-limited keys.
///
/// ## Rotation Rules:
/// - Strict round-robin over keys that are not exhausted
/// - A rate-limited key is marked exhausted and the cursor moves past it
/// - Without a cooldown, exhausted keys stay exhausted for the process lifetime
/// - With a cooldown, a key is re-admitted once the window has elapsed
///
/// Only the key-rotating client mutates the pool.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// A key selected for one attempt
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub index: usize,
    pub key: String,
}

// Keys never reach logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("index", &self.index)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Default)]
struct PoolState {
    cursor: usize,
    exhausted: HashMap<usize, Instant>,
}

pub struct CredentialPool {
    keys: Vec<String>,
    cooldown: Option<Duration>,
    state: Mutex<PoolState>,
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPool")
            .field("len", &self.keys.len())
            .field("cooldown", &self.cooldown)
            .field("exhausted_count", &self.exhausted_count())
            .finish()
    }
}

impl CredentialPool {
    /// Build a pool from configured keys, dropping blank entries
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let keys = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            keys,
            cooldown: None,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Re-admit exhausted keys after `cooldown`
    pub fn with_cooldown(mut self, cooldown: Option<Duration>) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(cooldown) = self.cooldown {
            state.exhausted.retain(|_, marked_at| marked_at.elapsed() < cooldown);
        }
        state
    }

    /// Next usable index at or after `start`, wrapping
    fn next_available(&self, state: &PoolState, start: usize) -> Option<usize> {
        let len = self.keys.len();
        (0..len)
            .map(|offset| (start + offset) % len)
            .find(|idx| !state.exhausted.contains_key(idx))
    }

    /// Key at the cursor, skipping forward past exhausted keys
    /// Returns None when the pool is empty or every key is exhausted
    pub fn current(&self) -> Option<Credential> {
        if self.keys.is_empty() {
            return None;
        }

        let mut state = self.lock();
        let index = self.next_available(&state, state.cursor)?;
        state.cursor = index;

        Some(Credential {
            index,
            key: self.keys[index].clone(),
        })
    }

    /// Record a rate limit on `index` and rotate past it
    ///
    /// The cursor only moves if it still points at `index`; a concurrent
    /// request may already have rotated.
    pub fn mark_exhausted(&self, index: usize) {
        if index >= self.keys.len() {
            return;
        }

        let mut state = self.lock();
        state.exhausted.insert(index, Instant::now());

        if state.cursor == index {
            let start = (index + 1) % self.keys.len();
            state.cursor = self.next_available(&state, start).unwrap_or(start);
        }
    }

    pub fn is_exhausted(&self, index: usize) -> bool {
        self.lock().exhausted.contains_key(&index)
    }

    pub fn exhausted_count(&self) -> usize {
        self.lock().exhausted.len()
    }

    pub fn cursor(&self) -> usize {
        self.lock().cursor
    }
}
