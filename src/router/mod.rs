//! Scheme-based request routing.
//!
//! ## Contents
//! - [`RequestRouter`] dispatches batched reads, finds and stores by identifier scheme
//! - [`RepositoryRegistry`] explicit scheme → [`Repository`] table
//! - [`HeartbeatRepository`] liveness repository registered by every data host
//! - [`MemoryStore`] in-memory repository with merge-on-store and regex find
//!
//! ## Quick wiring
//! ```text
//! RepositoryRegistry::new()
//!     .with("netatmo", netatmo)?      read-only source
//!     .with("mem", store)?            writable sink
//!        └─► RequestRouter::new(registry)
//!               └─► route_read / route_find / route_store
//! ```

mod heartbeat;
mod identifier;
mod memory;
mod registry;
mod repository;
#[allow(clippy::module_inception)]
mod router;

pub use heartbeat::{HEARTBEAT_SCHEME, HeartbeatRepository, heartbeat_request};
pub use identifier::{is_valid_scheme, split_scheme};
pub use memory::MemoryStore;
pub use registry::RepositoryRegistry;
pub use repository::Repository;
pub use router::RequestRouter;
