//! # In-process host directory.
//!
//! [`HostDirectory`] maps addresses to [`DataHost`]s and implements
//! [`Connector`]: its clients resolve the address on every call, so a host
//! that is removed or stopped shows up as [`EndpointError::Unavailable`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::collection::{Connector, TsClient};
use crate::error::EndpointError;
use crate::series::{NamedSeries, TimeSeries, TsInfo, UtcPeriod};

use super::data_host::DataHost;

type Hosts = Arc<RwLock<HashMap<String, Arc<DataHost>>>>;

/// Address book of in-process hosts.
#[derive(Clone, Default, Debug)]
pub struct HostDirectory {
    hosts: Hosts,
}

impl HostDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `host` reachable at its address, replacing any previous host there.
    pub fn register(&self, host: Arc<DataHost>) {
        self.hosts.write().insert(host.address().to_string(), host);
    }

    /// Removes the host at `address`.
    pub fn remove(&self, address: &str) -> Option<Arc<DataHost>> {
        self.hosts.write().remove(address)
    }

    /// Host registered at `address`.
    pub fn get(&self, address: &str) -> Option<Arc<DataHost>> {
        self.hosts.read().get(address).cloned()
    }
}

impl Connector for HostDirectory {
    fn connect(&self, address: &str) -> Arc<dyn TsClient> {
        Arc::new(LocalClient {
            hosts: Arc::clone(&self.hosts),
            address: address.to_string(),
        })
    }
}

/// Client bound to an address in a [`HostDirectory`].
struct LocalClient {
    hosts: Hosts,
    address: String,
}

impl LocalClient {
    fn host(&self) -> Result<Arc<DataHost>, EndpointError> {
        self.hosts
            .read()
            .get(&self.address)
            .cloned()
            .ok_or_else(|| EndpointError::Unavailable {
                address: self.address.clone(),
            })
    }
}

#[async_trait]
impl TsClient for LocalClient {
    async fn read(
        &self,
        ids: &[String],
        period: UtcPeriod,
    ) -> Result<Vec<TimeSeries>, EndpointError> {
        self.host()?.read(ids, period).await
    }

    async fn find(&self, query: &str) -> Result<Vec<TsInfo>, EndpointError> {
        self.host()?.find(query).await
    }

    async fn store(&self, series: Vec<NamedSeries>) -> Result<(), EndpointError> {
        self.host()?.store(series).await
    }
}
