//! # Rate limit configuration.
//!
//! [`RateLimit`] describes one provider quota: at most `action_limit` actions
//! per `timespan`, re-checked every `wait_time` while blocked.
//!
//! Durations deserialize from humantime strings:
//! ```
//! use std::time::Duration;
//! use collectvisor::RateLimit;
//!
//! let limit: RateLimit =
//!     serde_json::from_str(r#"{ "action_limit": 50, "timespan": "10s" }"#).unwrap();
//! assert_eq!(limit.timespan, Duration::from_secs(10));
//! assert_eq!(limit.wait_time, Duration::from_secs(1));
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// One provider quota.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct RateLimit {
    /// Maximum number of actions within `timespan`.
    pub action_limit: usize,
    /// Sliding window length.
    #[serde(with = "humantime_serde")]
    pub timespan: Duration,
    /// Sleep between re-checks while the limit is reached.
    #[serde(with = "humantime_serde", default = "default_wait_time")]
    pub wait_time: Duration,
}

fn default_wait_time() -> Duration {
    Duration::from_secs(1)
}

impl RateLimit {
    /// Quota with the default `wait_time` of one second.
    pub fn new(action_limit: usize, timespan: Duration) -> Self {
        Self {
            action_limit,
            timespan,
            wait_time: default_wait_time(),
        }
    }

    /// Returns a copy with a different `wait_time`.
    pub fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time;
        self
    }

    /// Rejects a zero `timespan` or `wait_time`.
    ///
    /// A zero `action_limit` is accepted; such a limiter never admits an action.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timespan.is_zero() {
            return Err(ConfigError::InvalidTimespan);
        }
        if self.wait_time.is_zero() {
            return Err(ConfigError::InvalidWaitTime);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_explicit_wait_time() {
        let limit: RateLimit = serde_json::from_str(
            r#"{ "action_limit": 500, "timespan": "1h", "wait_time": "250ms" }"#,
        )
        .unwrap();
        assert_eq!(limit.action_limit, 500);
        assert_eq!(limit.timespan, Duration::from_secs(3600));
        assert_eq!(limit.wait_time, Duration::from_millis(250));
    }

    #[test]
    fn zero_timespan_is_rejected() {
        let limit = RateLimit::new(1, Duration::ZERO);
        assert_eq!(limit.validate(), Err(ConfigError::InvalidTimespan));
    }

    #[test]
    fn zero_wait_time_is_rejected() {
        let limit = RateLimit::new(1, Duration::from_secs(1)).with_wait_time(Duration::ZERO);
        assert_eq!(limit.validate(), Err(ConfigError::InvalidWaitTime));

        let parsed: RateLimit = serde_json::from_str(
            r#"{ "action_limit": 5, "timespan": "10s", "wait_time": "0s" }"#,
        )
        .unwrap();
        assert!(crate::RateLimiterStack::from_limits([parsed]).is_err());
    }
}
