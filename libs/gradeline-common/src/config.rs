use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Highest numbered `JUDGE_API_KEY_<n>` variable that is scanned
pub const MAX_NUMBERED_KEYS: usize = 16;

/// Application configuration
/// Provides defaults with environment variable overrides
#[derive(Debug, Clone)]
pub struct Config {
    pub judge_base_url: String,
    pub judge_host: String,
    pub api_keys: Vec<String>,
    pub rate_limit_backoff_ms: u64,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub key_cooldown_secs: Option<u64>,
    pub request_timeout_ms: u64,
    pub redis_url: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            judge_base_url: lookup("JUDGE_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "https://judge0-ce.p.rapidapi.com".to_string()),
            judge_host: lookup("JUDGE_API_HOST")
                .unwrap_or_else(|| "judge0-ce.p.rapidapi.com".to_string()),
            api_keys: collect_api_keys(&lookup),
            rate_limit_backoff_ms: parse_var(&lookup, "RATE_LIMIT_BACKOFF_MS").unwrap_or(1000),
            poll_interval_ms: parse_var(&lookup, "POLL_INTERVAL_MS").unwrap_or(2000),
            max_poll_attempts: parse_var(&lookup, "MAX_POLL_ATTEMPTS").unwrap_or(30),
            key_cooldown_secs: parse_var(&lookup, "JUDGE_KEY_COOLDOWN_SECS"),
            request_timeout_ms: parse_var(&lookup, "REQUEST_TIMEOUT_MS").unwrap_or(10000),
            redis_url: lookup("REDIS_URL")
                .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string()),
            port: parse_var(&lookup, "PORT").unwrap_or(3000),
        }
    }

    pub fn new() -> Self {
        Self::from_env()
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn key_cooldown(&self) -> Option<Duration> {
        self.key_cooldown_secs.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a variable, falling back to None when unset or malformed
fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

/// Comma-separated list first, then numbered keys in index order.
/// Blank entries are dropped, never treated as errors.
fn collect_api_keys<F>(lookup: &F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let listed = lookup("JUDGE_API_KEYS")
        .map(|list| {
            list.split(',')
                .map(|k| k.trim().to_string())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let numbered = (1..=MAX_NUMBERED_KEYS)
        .filter_map(|n| lookup(&format!("JUDGE_API_KEY_{}", n)))
        .map(|k| k.trim().to_string());

    listed
        .into_iter()
        .chain(numbered)
        .filter(|k| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.judge_base_url, "https://judge0-ce.p.rapidapi.com");
        assert_eq!(config.judge_host, "judge0-ce.p.rapidapi.com");
        assert!(config.api_keys.is_empty());
        assert_eq!(config.rate_limit_backoff(), Duration::from_secs(1));
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.max_poll_attempts, 30);
        assert_eq!(config.key_cooldown(), None);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_api_keys_filter_blank_entries() {
        let config = config_from(&[
            ("JUDGE_API_KEYS", "alpha, ,beta,"),
            ("JUDGE_API_KEY_1", "gamma"),
            ("JUDGE_API_KEY_2", ""),
            ("JUDGE_API_KEY_4", "delta"),
        ]);
        assert_eq!(config.api_keys, vec!["alpha", "beta", "gamma", "delta"]);
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let config = config_from(&[
            ("JUDGE_BASE_URL", "http://localhost:2358/"),
            ("POLL_INTERVAL_MS", "250"),
            ("MAX_POLL_ATTEMPTS", "not-a-number"),
            ("JUDGE_KEY_COOLDOWN_SECS", "60"),
        ]);
        assert_eq!(config.judge_base_url, "http://localhost:2358");
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.max_poll_attempts, 30);
        assert_eq!(config.key_cooldown(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_numeric_overrides_of_every_width() {
        let config = config_from(&[
            ("RATE_LIMIT_BACKOFF_MS", "1500"),
            ("MAX_POLL_ATTEMPTS", "12"),
            ("REQUEST_TIMEOUT_MS", "5000"),
            ("PORT", "8080"),
        ]);
        assert_eq!(config.rate_limit_backoff(), Duration::from_millis(1500));
        assert_eq!(config.max_poll_attempts, 12);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.port, 8080);

        // Out of range for u16 falls back to the default
        assert_eq!(config_from(&[("PORT", "70000")]).port, 3000);
    }
}
