//! Runtime core: services, the manager, and lifecycle.
//!
//! Public API from this module: [`Service`] (with [`ServiceBuilder`]),
//! [`ServiceManager`] (with [`ManagerBuilder`]) and [`ManagerConfig`].
//!
//! Internal modules:
//! - [`runner`]: the per-service loop (cycle, failure reporting, cancellable wait);
//! - [`service`]: start/stop/restart/health of one service;
//! - [`manager`]: members, maintainer sweeps, graceful shutdown;
//! - [`builder`]: wiring of bus, subscriber listener and maintainer;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod manager;
mod runner;
mod service;
mod shutdown;

pub use builder::ManagerBuilder;
pub use config::ManagerConfig;
pub use manager::{MAINTAINER, ServiceManager};
pub use service::{HealthCheck, RestartAction, Service, ServiceBuilder};
