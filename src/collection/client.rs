use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EndpointError;
use crate::series::{NamedSeries, TimeSeries, TsInfo, UtcPeriod};

/// Client of a read/store endpoint (a data host).
///
/// Identifiers are full `<scheme>://<path>` strings; routing happens at the host.
#[async_trait]
pub trait TsClient: Send + Sync {
    /// Reads one series per identifier over `period`.
    async fn read(&self, ids: &[String], period: UtcPeriod)
    -> Result<Vec<TimeSeries>, EndpointError>;

    /// Runs a find query.
    async fn find(&self, query: &str) -> Result<Vec<TsInfo>, EndpointError>;

    /// Stores named series.
    async fn store(&self, series: Vec<NamedSeries>) -> Result<(), EndpointError>;
}

/// Creates clients for endpoint addresses.
pub trait Connector: Send + Sync {
    /// Opens a client for `address`. Failures surface on first use.
    fn connect(&self, address: &str) -> Arc<dyn TsClient>;
}
