//! Periodic data collection between endpoints.
//!
//! - [`DataCollectionTask`] reads series from one endpoint and stores them in another
//! - [`CollectionPeriod`] relative or absolute read window plus cadence
//! - [`TsClient`] / [`Connector`] the endpoint contract the task talks through

mod client;
mod period;
mod task;

pub use client::{Connector, TsClient};
pub use period::CollectionPeriod;
pub use task::{CollectionOutcome, DataCollectionTask};
