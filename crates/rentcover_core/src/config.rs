//! Runtime tuning for ledger services.
//!
//! # Responsibility
//! - Hold contention/retry bounds and account policy in one place.
//! - Allow hosts to load overrides from JSON; missing keys keep defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default bounded wait for the store's write lock.
pub const DEFAULT_LOCK_WAIT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Total attempts (first try included) before surfacing `Busy`.
    pub max_attempts: u32,
    /// Backoff before the first retry; doubled on every further retry.
    pub base_backoff_ms: u64,
    /// Upper bound for a single backoff sleep.
    pub max_backoff_ms: u64,
    /// How long one lock acquisition may block before it counts as contention.
    pub lock_wait_ms: u64,
    /// Minimum accepted password length for new or rotated passwords.
    pub min_password_len: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff_ms: 10,
            max_backoff_ms: 200,
            lock_wait_ms: DEFAULT_LOCK_WAIT_MS,
            min_password_len: 8,
        }
    }
}

impl LedgerConfig {
    /// Parses a JSON override document.
    pub fn from_json(value: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(value)
    }

    pub fn lock_wait(&self) -> Duration {
        Duration::from_millis(self.lock_wait_ms)
    }

    /// Sleep before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(
            self.base_backoff_ms
                .saturating_mul(factor)
                .min(self.max_backoff_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::LedgerConfig;
    use std::time::Duration;

    #[test]
    fn backoff_doubles_and_caps() {
        let config = LedgerConfig::default();
        assert_eq!(config.backoff(1), Duration::from_millis(10));
        assert_eq!(config.backoff(2), Duration::from_millis(20));
        assert_eq!(config.backoff(3), Duration::from_millis(40));
        assert_eq!(config.backoff(30), Duration::from_millis(200));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = LedgerConfig::from_json(r#"{ "max_attempts": 2 }"#).unwrap();
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.min_password_len, LedgerConfig::default().min_password_len);
    }
}
