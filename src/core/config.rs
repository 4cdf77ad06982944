//! # Manager configuration.
//!
//! Provides [`ManagerConfig`], centralized settings for a
//! [`ServiceManager`](crate::ServiceManager).
//!
//! ## Sentinel values
//! - `grace = 0s` → do not wait for loops to exit on `stop_services`
//! - `bus_capacity` is clamped to a minimum of 1

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::policies::RestartPolicy;

/// Configuration for a service manager.
///
/// Durations deserialize from humantime strings (`"60s"`, `"5m"`).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Time between maintainer health sweeps.
    #[serde(with = "humantime_serde")]
    pub health_check_interval: Duration,

    /// Maximum time `stop_services` waits for loops to finish their current cycle.
    #[serde(with = "humantime_serde")]
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Restart ceiling for persistently unhealthy services.
    pub restart: RestartPolicy,
}

impl ManagerConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Rejects a zero health-check interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.health_check_interval.is_zero() {
            return Err(ConfigError::InvalidHealthCheckInterval);
        }
        Ok(())
    }
}

impl Default for ManagerConfig {
    /// Default configuration:
    ///
    /// - `health_check_interval = 60s`
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    /// - `restart = RestartPolicy::Unbounded`
    fn default() -> Self {
        Self {
            health_check_interval: Duration::from_secs(60),
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
            restart: RestartPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: ManagerConfig =
            serde_json::from_str(r#"{ "health_check_interval": "5s" }"#).unwrap();
        assert_eq!(cfg.health_check_interval, Duration::from_secs(5));
        assert_eq!(cfg.grace, Duration::from_secs(30));
        assert_eq!(cfg.restart, RestartPolicy::Unbounded);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let cfg = ManagerConfig {
            health_check_interval: Duration::ZERO,
            ..ManagerConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidHealthCheckInterval));
    }
}
