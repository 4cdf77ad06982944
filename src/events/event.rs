//! # Runtime events emitted by services, the maintainer, and the manager.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Service lifecycle**: start/stop of a service's execution context
//! - **Cycles**: failures of individual task cycles
//! - **Maintenance**: health sweep outcomes and restarts
//! - **Shutdown / subscribers**: manager-wide shutdown and fan-out health
//!
//! The [`Event`] struct carries metadata such as the service name, cycle number,
//! restart count, and error text.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use collectvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::CycleFailed)
//!     .with_service("netatmo_short")
//!     .with_cycle(3)
//!     .with_error("read timed out");
//!
//! assert_eq!(ev.kind, EventKind::CycleFailed);
//! assert_eq!(ev.service.as_deref(), Some("netatmo_short"));
//! assert_eq!(ev.cycle, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `service` (subscriber name), `error` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `service` (subscriber name), `error` (reason).
    SubscriberOverflow,

    // === Service lifecycle ===
    /// Service was added to a manager.
    ///
    /// Sets: `service`.
    ServiceAdded,

    /// Execution context spawned; the first cycle follows immediately.
    ///
    /// Sets: `service`.
    ServiceStarted,

    /// `stop()` was called; the loop exits at its next check.
    ///
    /// Sets: `service`.
    ServiceStopRequested,

    /// The loop exited.
    ///
    /// Sets: `service`, `cycle` (cycles completed by this context).
    ServiceStopped,

    // === Cycles ===
    /// One cycle returned an error or panicked; the schedule continues.
    ///
    /// Sets: `service`, `cycle`, `error`.
    CycleFailed,

    // === Maintenance ===
    /// Health check returned false during a maintainer sweep.
    ///
    /// Sets: `service`, `restarts` (consecutive restarts so far).
    ServiceUnhealthy,

    /// Maintainer (or caller) is restarting the service.
    ///
    /// Sets: `service`, `restarts`.
    ServiceRestarting,

    /// The caller-supplied restart action failed; the service is started anyway.
    ///
    /// Sets: `service`, `error`.
    RestartActionFailed,

    /// The restart ceiling was reached; no more restarts until the service is healthy.
    ///
    /// Sets: `service`, `restarts`.
    RestartLimitReached,

    // === Shutdown ===
    /// Shutdown requested (OS signal observed).
    ShutdownRequested,

    /// All services stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some services were still inside a cycle.
    ///
    /// Sets: `error` (stuck services).
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the service (or subscriber), if applicable.
    pub service: Option<Arc<str>>,
    /// Cycle number (starting from 1, per execution context).
    pub cycle: Option<u64>,
    /// Consecutive restarts of the service.
    pub restarts: Option<u32>,
    /// Human-readable error or detail.
    pub error: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            cycle: None,
            restarts: None,
            error: None,
        }
    }

    /// Attaches a service name.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches a cycle number.
    #[inline]
    pub fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = Some(cycle);
        self
    }

    /// Attaches a restart count.
    #[inline]
    pub fn with_restarts(mut self, restarts: u32) -> Self {
        self.restarts = Some(restarts);
        self
    }

    /// Attaches an error message.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_service(subscriber)
            .with_error(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_service(subscriber)
            .with_error(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::ServiceStarted);
        let b = Event::new(EventKind::ServiceStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn overflow_event_names_subscriber() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.service.as_deref(), Some("audit"));
        assert_eq!(ev.error.as_deref(), Some("full"));
    }
}
