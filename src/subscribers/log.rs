//! # LogWriter: renders events through `tracing`
//!
//! A subscriber that turns every [`Event`] into one `tracing` record, with the
//! level chosen by severity:
//!
//! | Event                                     | Level   |
//! |-------------------------------------------|---------|
//! | `ServiceAdded`, started/stopped, shutdown | `info`  |
//! | `ServiceStopRequested`                    | `debug` |
//! | `ServiceUnhealthy`, `ServiceRestarting`   | `warn`  |
//! | `CycleFailed`, restart failures, overflow | `error` |

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let service = e.service.as_deref().unwrap_or("-");
        let err = e.error.as_deref().unwrap_or("");
        match e.kind {
            EventKind::ServiceAdded => info!(service, "service added"),
            EventKind::ServiceStarted => info!(service, "service started"),
            EventKind::ServiceStopRequested => debug!(service, "stop requested"),
            EventKind::ServiceStopped => {
                info!(service, cycles = e.cycle.unwrap_or(0), "service stopped")
            }
            EventKind::CycleFailed => {
                error!(service, cycle = e.cycle.unwrap_or(0), error = err, "cycle failed")
            }
            EventKind::ServiceUnhealthy => {
                warn!(service, restarts = e.restarts.unwrap_or(0), "service unhealthy")
            }
            EventKind::ServiceRestarting => {
                warn!(service, restarts = e.restarts.unwrap_or(0), "restarting service")
            }
            EventKind::RestartActionFailed => error!(service, error = err, "restart action failed"),
            EventKind::RestartLimitReached => error!(
                service,
                restarts = e.restarts.unwrap_or(0),
                "restart limit reached; waiting for service to recover"
            ),
            EventKind::ShutdownRequested => info!("shutdown requested"),
            EventKind::AllStoppedWithin => info!("all services stopped within grace"),
            EventKind::GraceExceeded => error!(stuck = err, "grace exceeded"),
            EventKind::SubscriberOverflow => {
                error!(subscriber = service, reason = err, "subscriber dropped event")
            }
            EventKind::SubscriberPanicked => {
                error!(subscriber = service, info = err, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
