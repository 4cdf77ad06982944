//! # collectvisor
//!
//! **Collectvisor** keeps periodic time-series collection jobs alive.
//!
//! It provides a supervisor for named periodic services with health checks and
//! restarts, a sliding-window rate limiter for quota-bound providers, a
//! collection task that copies series between endpoints, and a router that
//! dispatches batched queries to repositories by identifier scheme.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌──────────────────────┐  ┌──────────────────────┐
//!   │  DataCollectionTask  │  │  Service (any task)  │
//!   │ read ─► store, hourly│  │                      │
//!   └──────────┬───────────┘  └──────────┬───────────┘
//!              ▼ into_service()          ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  ServiceManager                                           │
//! │  - members (start / stop / restart, one loop each)        │
//! │  - maintainer (health sweep every health_check_interval)  │
//! │  - Bus ─► listener ─► SubscriberSet ─► LogWriter, ...     │
//! └───────────────────────────────────────────────────────────┘
//!
//!   TsClient (via Connector) ──► DataHost ──► RequestRouter
//!                                               ├─ heartbeat://  HeartbeatRepository
//!                                               ├─ mem://        MemoryStore
//!                                               └─ netatmo://    provider repository
//!                                                                 └─ RateLimiterStack
//! ```
//!
//! ### Service loop
//! ```text
//! start() ──► loop {
//!   ├─► cancelled? ─► exit (ServiceStopped)
//!   ├─► cycle (under the service's cycle lock)
//!   │       └─ Err / panic ─► CycleFailed, schedule continues
//!   └─► sleep(interval), cancellable
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Supervision**   | Periodic services, health sweeps, graceful shutdown.     | [`Service`], [`ServiceManager`]             |
//! | **Rate limiting** | Sliding-window quotas with blocking back-pressure.       | [`RateLimiter`], [`RateLimiterStack`]       |
//! | **Collection**    | Read-then-store between endpoints on a schedule.         | [`DataCollectionTask`], [`CollectionPeriod`]|
//! | **Routing**       | Scheme-based batched dispatch to repositories.           | [`RequestRouter`], [`Repository`]           |
//! | **Subscriber API**| Hook into runtime events.                                | [`Subscribe`]                               |
//! | **Errors**        | Typed errors per layer.                                  | [`ConfigError`], [`RouteError`], [`TaskError`] |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], rendering events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use collectvisor::{ManagerConfig, Service, ServiceManager, TaskError, TaskFn, TaskRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tick: TaskRef = TaskFn::arc("tick", |_ctx| async move {
//!         println!("tick");
//!         Ok::<(), TaskError>(())
//!     });
//!
//!     let manager = ServiceManager::builder(ManagerConfig::default())
//!         .with_services([Service::builder("tick")
//!             .task(tick)
//!             .interval(Duration::from_millis(50))
//!             .build()?])
//!         .build()?;
//!
//!     manager.start_services();
//!     tokio::time::sleep(Duration::from_millis(120)).await;
//!     manager.stop_services().await?;
//!     Ok(())
//! }
//! ```

pub mod collection;
mod core;
mod error;
mod events;
pub mod host;
pub mod limiter;
mod policies;
pub mod router;
pub mod series;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use collection::{
    CollectionOutcome, CollectionPeriod, Connector, DataCollectionTask, TsClient,
};
pub use core::{
    HealthCheck, MAINTAINER, ManagerBuilder, ManagerConfig, RestartAction, Service,
    ServiceBuilder, ServiceManager,
};
pub use error::{ConfigError, EndpointError, RouteError, RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use host::{DataHost, HostDirectory};
pub use limiter::{RateLimit, RateLimiter, RateLimiterStack};
pub use policies::RestartPolicy;
pub use router::{
    HeartbeatRepository, MemoryStore, Repository, RepositoryRegistry, RequestRouter,
};
pub use series::{NamedSeries, Point, TimeSeries, TsInfo, UtcPeriod};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{Task, TaskFn, TaskRef};

// Built-in logger subscriber.
// Disable with: `--no-default-features`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
