//! Restart policies.
//!
//! ## Contents
//! - [`RestartPolicy`] how many consecutive restarts the maintainer attempts
//!   for a persistently unhealthy service
//!
//! ## Quick wiring
//! ```text
//! ManagerConfig { restart: RestartPolicy, .. }
//!      └─► ServiceManager::check_service_health_and_restart uses
//!          restart.allows(consecutive_restarts) before each restart
//! ```

mod restart;

pub use restart::RestartPolicy;
