//! # Heartbeat repository.
//!
//! A dummy repository every data host registers under [`HEARTBEAT_SCHEME`].
//! Answering a heartbeat query proves the host is up and routing; collection
//! tasks use it as their health check.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::EndpointError;
use crate::series::{TimeSeries, TsInfo, UtcPeriod};

use super::repository::Repository;

/// Scheme the heartbeat repository is registered under.
pub const HEARTBEAT_SCHEME: &str = "heartbeat";

const CALLBACK: &str = "callback/";

/// Builds the find query answered by [`HeartbeatRepository`].
///
/// ```
/// use collectvisor::router::heartbeat_request;
///
/// assert_eq!(heartbeat_request("ping"), "heartbeat://callback/ping");
/// ```
pub fn heartbeat_request(message: &str) -> String {
    format!("{HEARTBEAT_SCHEME}://{CALLBACK}{message}")
}

/// Answers reads with constant series and finds with an echo of the message.
#[derive(Clone, Debug)]
pub struct HeartbeatRepository {
    dt: Duration,
    value: f64,
}

impl HeartbeatRepository {
    /// Heartbeat answering reads with `value` every `dt`.
    pub fn new(dt: Duration, value: f64) -> Self {
        Self { dt, value }
    }
}

impl Default for HeartbeatRepository {
    /// Hourly points of value `1.0`.
    fn default() -> Self {
        Self::new(Duration::from_secs(3600), 1.0)
    }
}

#[async_trait]
impl Repository for HeartbeatRepository {
    async fn read(
        &self,
        paths: &[String],
        period: UtcPeriod,
    ) -> Result<Vec<TimeSeries>, EndpointError> {
        Ok(paths
            .iter()
            .map(|_| TimeSeries::constant(period, self.dt, self.value))
            .collect())
    }

    async fn find(&self, query: &str) -> Result<Vec<TsInfo>, EndpointError> {
        let message = query.strip_prefix(CALLBACK).unwrap_or(query);
        tracing::debug!(message, "heartbeat received");
        Ok(vec![TsInfo::now(format!("heartbeat: {message}"), None)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn find_echoes_message() {
        let repo = HeartbeatRepository::default();
        let found = repo.find("callback/Health check from t").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "heartbeat: Health check from t");
    }

    #[tokio::test]
    async fn read_answers_every_path() {
        let repo = HeartbeatRepository::new(Duration::from_secs(600), 2.0);
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let period = UtcPeriod::new(start, start + chrono::TimeDelta::hours(1));
        let out = repo
            .read(&["x".to_string(), "y".to_string()], period)
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), 6);
        assert!(out[1].points().iter().all(|p| p.value == 2.0));
    }
}
