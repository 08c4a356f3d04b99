//! Retry policy for delivery operations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry ceiling and backoff rules
///
/// A record's `retry_count` goes up by one every pass that stops on it. Once
/// the count reaches `max_retries` the record is quarantined instead of
/// retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Failed passes allowed before a record is quarantined.
    ///
    /// Default: 5
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Delay after a failure that carried no wait hint (in seconds).
    ///
    /// Default: 60 seconds
    #[serde(default = "defaults::default_backoff_secs")]
    pub default_backoff_secs: u64,

    /// Added to a provider's wait hint before retrying (in seconds).
    ///
    /// Default: 5 seconds
    #[serde(default = "defaults::wait_hint_margin_secs")]
    pub wait_hint_margin_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            default_backoff_secs: defaults::default_backoff_secs(),
            wait_hint_margin_secs: defaults::wait_hint_margin_secs(),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a record that has failed `retry_count` passes may be retried.
    #[must_use]
    pub const fn should_retry(&self, retry_count: u32) -> bool {
        retry_count < self.max_retries
    }

    /// Retries left before quarantine. Returns `0` once the ceiling is reached.
    #[must_use]
    pub const fn remaining_attempts(&self, retry_count: u32) -> u32 {
        self.max_retries.saturating_sub(retry_count)
    }

    /// How long to wait before the next pass.
    ///
    /// The provider's wait hint plus the safety margin when there is one,
    /// otherwise the default backoff.
    #[must_use]
    pub fn backoff(&self, wait_hint: Option<Duration>) -> Duration {
        wait_hint.map_or_else(
            || Duration::from_secs(self.default_backoff_secs),
            |hint| hint.saturating_add(Duration::from_secs(self.wait_hint_margin_secs)),
        )
    }
}

mod defaults {
    pub const fn max_retries() -> u32 {
        5
    }

    pub const fn default_backoff_secs() -> u64 {
        60
    }

    pub const fn wait_hint_margin_secs() -> u64 {
        5
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.default_backoff_secs, 60);
        assert_eq!(policy.wait_hint_margin_secs, 5);
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(4));
        assert!(!policy.should_retry(5));
        assert!(!policy.should_retry(6));
    }

    #[test]
    fn test_remaining_attempts() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.remaining_attempts(0), 5);
        assert_eq!(policy.remaining_attempts(4), 1);
        assert_eq!(policy.remaining_attempts(5), 0);
        assert_eq!(policy.remaining_attempts(30), 0);
    }

    #[test]
    fn test_backoff() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.backoff(None), Duration::from_secs(60));
        assert_eq!(
            policy.backoff(Some(Duration::from_secs(30))),
            Duration::from_secs(35)
        );
        assert_eq!(policy.backoff(Some(Duration::ZERO)), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let policy: RetryPolicy = ron::from_str("(max_retries: 2)").expect("valid policy");
        assert_eq!(
            policy,
            RetryPolicy {
                max_retries: 2,
                ..RetryPolicy::default()
            }
        );
    }
}
