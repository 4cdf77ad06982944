use async_trait::async_trait;

use crate::error::EndpointError;
use crate::series::{NamedSeries, TimeSeries, TsInfo, UtcPeriod};

/// A data source or sink reachable under one scheme.
///
/// Every call receives identifier *paths*: the part after `<scheme>://`.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Reads one series per path, in the order given.
    async fn read(&self, paths: &[String], period: UtcPeriod)
    -> Result<Vec<TimeSeries>, EndpointError>;

    /// Answers a find query.
    async fn find(&self, query: &str) -> Result<Vec<TsInfo>, EndpointError>;

    /// Stores series keyed by path. Read-only repositories keep the default.
    async fn store(&self, _series: Vec<NamedSeries>) -> Result<(), EndpointError> {
        Err(EndpointError::Unsupported {
            op: "store",
            target: std::any::type_name::<Self>().to_string(),
        })
    }
}
