//! # Demo: supervised relay from a quota-bound source into a memory store
//!
//! Two in-process hosts:
//! - `source:20000` serves `station://...` from a simulated provider limited to
//!   5 requests per 10s;
//! - `sink:20001` serves `mem://...` from a [`MemoryStore`].
//!
//! A [`DataCollectionTask`] copies the last 2h (minus 10m) every 2s under a
//! [`ServiceManager`]. Stop with Ctrl-C.
//!
//! ```text
//! RUST_LOG=info cargo run --example relay
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeDelta;
use tracing_subscriber::EnvFilter;

use collectvisor::{
    CollectionPeriod, Connector, DataCollectionTask, DataHost, EndpointError, HostDirectory,
    LogWriter, ManagerConfig, MemoryStore, Point, RateLimit, RateLimiterStack, Repository,
    RepositoryRegistry, ServiceManager, Subscribe, TimeSeries, TsInfo, UtcPeriod,
};

/// Simulated weather provider: every read costs one request of quota.
struct Station {
    quota: RateLimiterStack,
}

#[async_trait]
impl Repository for Station {
    async fn read(
        &self,
        paths: &[String],
        period: UtcPeriod,
    ) -> Result<Vec<TimeSeries>, EndpointError> {
        self.quota.acquire("station").await;
        Ok(paths
            .iter()
            .enumerate()
            .map(|(i, _)| {
                let mut t = period.start;
                let mut points = Vec::new();
                while t < period.end {
                    points.push(Point::new(t, 10.0 + i as f64));
                    t += TimeDelta::minutes(5);
                }
                TimeSeries::new(points)
            })
            .collect())
    }

    async fn find(&self, query: &str) -> Result<Vec<TsInfo>, EndpointError> {
        Ok(vec![TsInfo::now(query, None)])
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let quota = RateLimiterStack::from_limits([
        RateLimit::new(5, Duration::from_secs(10)).with_wait_time(Duration::from_millis(500))
    ])?;
    let source = Arc::new(DataHost::new(
        "source:20000",
        RepositoryRegistry::new().with("station", Arc::new(Station { quota }))?,
    )?);
    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(DataHost::new(
        "sink:20001",
        RepositoryRegistry::new().with("mem", store.clone())?,
    )?);
    source.start().await?;
    sink.start().await?;

    let directory = HostDirectory::new();
    directory.register(source.clone());
    directory.register(sink.clone());
    let connector: Arc<dyn Connector> = Arc::new(directory);

    let relay = Arc::new(DataCollectionTask::new(
        "station_relay",
        source.address(),
        vec!["station://oslo/temperature".into(), "station://oslo/humidity".into()],
        CollectionPeriod::relative(
            Duration::from_secs(7200),
            Duration::from_secs(600),
            Duration::from_secs(2),
        ),
        sink.address(),
        vec!["mem://oslo/temperature".into(), "mem://oslo/humidity".into()],
        connector,
    )?);

    let cfg = ManagerConfig {
        health_check_interval: Duration::from_secs(10),
        grace: Duration::from_secs(5),
        ..ManagerConfig::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let manager = ServiceManager::builder(cfg)
        .with_subscribers(subs)
        .with_services([relay.into_service()?])
        .build()?;

    tracing::info!(maintainer = %manager.maintainer_name(), "running; Ctrl-C to stop");
    manager.run_until_signal().await?;

    for id in store.ids() {
        let points = store.get(&id).map_or(0, |s| s.len());
        tracing::info!(%id, points, "stored");
    }
    source.stop();
    sink.stop();
    Ok(())
}
