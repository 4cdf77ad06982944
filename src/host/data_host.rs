//! # DataHost: a named endpoint serving routed queries.
//!
//! A host wraps a [`RequestRouter`] whose registry always contains the
//! [`HeartbeatRepository`] under [`HEARTBEAT_SCHEME`]. While stopped every
//! request fails with [`EndpointError::Unavailable`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::error::{ConfigError, EndpointError};
use crate::router::{
    HEARTBEAT_SCHEME, HeartbeatRepository, RepositoryRegistry, RequestRouter, heartbeat_request,
};
use crate::series::{NamedSeries, TimeSeries, TsInfo, UtcPeriod};

/// Endpoint serving reads, finds and stores through a router.
#[derive(Debug)]
pub struct DataHost {
    address: String,
    router: RequestRouter,
    running: AtomicBool,
}

impl DataHost {
    /// Creates a stopped host; registers the heartbeat repository.
    ///
    /// # Errors
    /// [`ConfigError::DuplicateScheme`] if `registry` already uses the heartbeat scheme.
    pub fn new(
        address: impl Into<String>,
        mut registry: RepositoryRegistry,
    ) -> Result<Self, ConfigError> {
        registry.register(HEARTBEAT_SCHEME, Arc::new(HeartbeatRepository::default()))?;
        Ok(Self {
            address: address.into(),
            router: RequestRouter::new(registry),
            running: AtomicBool::new(false),
        })
    }

    /// Address clients connect to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The host's router.
    pub fn router(&self) -> &RequestRouter {
        &self.router
    }

    /// True while the host accepts requests.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starts accepting requests and verifies the heartbeat answers.
    ///
    /// Starting a running host is logged and ignored.
    pub async fn start(&self) -> Result<(), EndpointError> {
        if self.running.swap(true, Ordering::AcqRel) {
            info!(address = %self.address, "host already running");
            return Ok(());
        }
        info!(address = %self.address, repositories = ?self.router.schemes(), "host started");

        match self.find(&heartbeat_request("startup verification")).await {
            Ok(found) if !found.is_empty() => Ok(()),
            Ok(_) => {
                self.stop();
                Err(EndpointError::Other(format!(
                    "host {} is not answering heartbeats",
                    self.address
                )))
            }
            Err(e) => {
                self.stop();
                Err(e)
            }
        }
    }

    /// Stops accepting requests. Stopping a stopped host is logged and ignored.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!(address = %self.address, "host stopped");
        } else {
            info!(address = %self.address, "host already stopped");
        }
    }

    fn ensure_running(&self) -> Result<(), EndpointError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(EndpointError::Unavailable {
                address: self.address.clone(),
            })
        }
    }

    /// Routed read.
    pub async fn read(
        &self,
        ids: &[String],
        period: UtcPeriod,
    ) -> Result<Vec<TimeSeries>, EndpointError> {
        self.ensure_running()?;
        info!(address = %self.address, ids = ids.len(), "read request");
        Ok(self.router.route_read(ids, period).await?)
    }

    /// Routed find.
    pub async fn find(&self, query: &str) -> Result<Vec<TsInfo>, EndpointError> {
        self.ensure_running()?;
        Ok(self.router.route_find(query).await?)
    }

    /// Routed store.
    pub async fn store(&self, series: Vec<NamedSeries>) -> Result<(), EndpointError> {
        self.ensure_running()?;
        Ok(self.router.route_store(series).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stopped_host_is_unavailable() {
        let host = DataHost::new("h:1", RepositoryRegistry::new()).unwrap();
        let err = host.find(&heartbeat_request("x")).await.unwrap_err();
        assert_eq!(err, EndpointError::Unavailable { address: "h:1".into() });

        host.start().await.unwrap();
        assert!(host.is_running());
        let found = host.find(&heartbeat_request("x")).await.unwrap();
        assert_eq!(found[0].name, "heartbeat: x");

        host.stop();
        host.stop();
        assert!(!host.is_running());
    }

    #[test]
    fn heartbeat_scheme_is_reserved() {
        let registry = RepositoryRegistry::new()
            .with(HEARTBEAT_SCHEME, Arc::new(HeartbeatRepository::default()))
            .unwrap();
        let err = DataHost::new("h:1", registry).unwrap_err();
        assert_eq!(err.as_label(), "config_duplicate_scheme");
    }
}
