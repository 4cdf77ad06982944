//! # DataCollectionTask: periodic read-then-store between two endpoints.
//!
//! ```text
//! collect_data()
//!   ├─► read_client.read(read_ids, read_period.period())
//!   │      └─ error        ─► log, ReadFailed / Unavailable (no store)
//!   ├─► nothing read       ─► Empty (no store)
//!   ├─► count mismatch     ─► log, ReadFailed (no store)
//!   └─► write_client.store(zip(write_ids, series))
//!          ├─ ok           ─► Stored { series }
//!          └─ error        ─► log, StoreFailed / Unavailable
//! ```
//!
//! A cycle never fails: every outcome is logged and the service keeps its schedule.
//! The health check asks both endpoints for a heartbeat; the restart action
//! reconnects both clients.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::Service;
use crate::error::{ConfigError, EndpointError, TaskError};
use crate::router::heartbeat_request;
use crate::series::{NamedSeries, TimeSeries};
use crate::tasks::{Task, TaskRef};

use super::client::{Connector, TsClient};
use super::period::CollectionPeriod;

/// Result of one collection cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionOutcome {
    /// `series` series were read and stored.
    Stored {
        /// Number of stored series.
        series: usize,
    },
    /// The read returned nothing; nothing was stored.
    Empty,
    /// The read failed or returned an unexpected number of series.
    ReadFailed,
    /// The store failed.
    StoreFailed,
    /// An endpoint could not be reached.
    Unavailable,
}

struct Clients {
    read: Arc<dyn TsClient>,
    write: Arc<dyn TsClient>,
}

/// Copies series from a read endpoint to a write endpoint on a schedule.
pub struct DataCollectionTask {
    name: String,
    read_address: String,
    read_ids: Vec<String>,
    read_period: CollectionPeriod,
    write_address: String,
    write_ids: Vec<String>,
    connector: Arc<dyn Connector>,
    clients: RwLock<Clients>,
}

impl DataCollectionTask {
    /// Creates the task and connects both clients.
    ///
    /// `read_ids[i]` is stored as `write_ids[i]`.
    ///
    /// # Errors
    /// [`ConfigError::LengthMismatch`] if the identifier lists differ in length.
    pub fn new(
        name: impl Into<String>,
        read_address: impl Into<String>,
        read_ids: Vec<String>,
        read_period: CollectionPeriod,
        write_address: impl Into<String>,
        write_ids: Vec<String>,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if read_ids.len() != write_ids.len() {
            return Err(ConfigError::LengthMismatch {
                task: name,
                read: read_ids.len(),
                write: write_ids.len(),
            });
        }
        let read_address = read_address.into();
        let write_address = write_address.into();
        let clients = Clients {
            read: connector.connect(&read_address),
            write: connector.connect(&write_address),
        };
        Ok(Self {
            name,
            read_address,
            read_ids,
            read_period,
            write_address,
            write_ids,
            connector,
            clients: RwLock::new(clients),
        })
    }

    /// Task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read window and cadence.
    pub fn read_period(&self) -> &CollectionPeriod {
        &self.read_period
    }

    fn clients(&self) -> (Arc<dyn TsClient>, Arc<dyn TsClient>) {
        let clients = self.clients.read();
        (Arc::clone(&clients.read), Arc::clone(&clients.write))
    }

    /// Replaces both clients with fresh connections.
    pub fn restart_clients(&self) {
        let clients = Clients {
            read: self.connector.connect(&self.read_address),
            write: self.connector.connect(&self.write_address),
        };
        *self.clients.write() = clients;
        debug!(task = %self.name, "clients reconnected");
    }

    /// True only if both endpoints answer a heartbeat find.
    pub async fn health_check(&self) -> bool {
        let request = heartbeat_request(&format!("Health check from {}", self.name));
        let (read, write) = self.clients();
        for client in [read, write] {
            match client.find(&request).await {
                Ok(found) if !found.is_empty() => {}
                Ok(_) => return false,
                Err(e) => {
                    debug!(task = %self.name, error = %e, "health check failed");
                    return false;
                }
            }
        }
        true
    }

    /// Runs one read-then-store cycle. Never fails; see [`CollectionOutcome`].
    pub async fn collect_data(&self) -> CollectionOutcome {
        let (read, write) = self.clients();

        let data = match read.read(&self.read_ids, self.read_period.period()).await {
            Ok(data) => data,
            Err(e) => {
                error!(task = %self.name, address = %self.read_address, error = %e, "read failed");
                return failure(&e, CollectionOutcome::ReadFailed);
            }
        };

        if data.iter().all(TimeSeries::is_empty) {
            debug!(task = %self.name, "read returned no data");
            return CollectionOutcome::Empty;
        }
        if data.len() != self.write_ids.len() {
            warn!(
                task = %self.name,
                expected = self.write_ids.len(),
                got = data.len(),
                "read returned an unexpected number of series; not storing"
            );
            return CollectionOutcome::ReadFailed;
        }

        let count = data.len();
        let named: Vec<NamedSeries> = self
            .write_ids
            .iter()
            .zip(data)
            .map(|(id, series)| NamedSeries::new(id.clone(), series))
            .collect();

        match write.store(named).await {
            Ok(()) => {
                info!(task = %self.name, series = count, "read and store complete");
                CollectionOutcome::Stored { series: count }
            }
            Err(e) => {
                error!(task = %self.name, address = %self.write_address, error = %e, "store failed");
                failure(&e, CollectionOutcome::StoreFailed)
            }
        }
    }

    /// Wraps the task in a [`Service`]: interval = wait time, health check and
    /// restart action bound to this task.
    ///
    /// # Errors
    /// [`ConfigError::InvalidInterval`] if the period's wait time is zero.
    pub fn into_service(self: Arc<Self>) -> Result<Service, ConfigError> {
        let health = Arc::clone(&self);
        let restart = Arc::clone(&self);
        let interval = self.read_period.wait_time();
        let name = self.name.clone();
        let task: TaskRef = self;

        Service::builder(name)
            .task(task)
            .interval(interval)
            .health_check(move || {
                let task = Arc::clone(&health);
                async move { task.health_check().await }
            })
            .restart_action(move || {
                let task = Arc::clone(&restart);
                async move {
                    task.restart_clients();
                    Ok(())
                }
            })
            .build()
    }
}

fn failure(e: &EndpointError, otherwise: CollectionOutcome) -> CollectionOutcome {
    match e {
        EndpointError::Unavailable { .. } => CollectionOutcome::Unavailable,
        _ => otherwise,
    }
}

#[async_trait]
impl Task for DataCollectionTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _ctx: CancellationToken) -> Result<(), TaskError> {
        self.collect_data().await;
        Ok(())
    }
}

impl std::fmt::Debug for DataCollectionTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataCollectionTask")
            .field("name", &self.name)
            .field("read_address", &self.read_address)
            .field("write_address", &self.write_address)
            .field("series", &self.read_ids.len())
            .finish()
    }
}
