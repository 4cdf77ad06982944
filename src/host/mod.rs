//! In-process data hosts.
//!
//! - [`DataHost`] an addressable endpoint wrapping a [`RequestRouter`](crate::router::RequestRouter)
//! - [`HostDirectory`] a [`Connector`](crate::collection::Connector) resolving addresses to hosts

mod data_host;
mod directory;

pub use data_host::DataHost;
pub use directory::HostDirectory;
