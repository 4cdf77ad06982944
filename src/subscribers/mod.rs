//! # Event subscribers for the collectvisor runtime.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Service loop ── publish(Event) ──► Bus ──► manager listener ──► SubscriberSet
//!                                                                     │
//!                                                          ┌──────────┼──────────┐
//!                                                          ▼          ▼          ▼
//!                                                      LogWriter   Metrics    Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use collectvisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct RestartCounter;
//!
//! #[async_trait]
//! impl Subscribe for RestartCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::ServiceRestarting {
//!             // increment restart counter
//!         }
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
