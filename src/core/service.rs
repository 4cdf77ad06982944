//! # Supervised periodic service.
//!
//! A [`Service`] owns an optional periodic task, a health check, and an optional
//! restart action. While running it has exactly one live execution context
//! (see [`runner`](super::runner)).
//!
//! ```text
//! Service::builder("netatmo")
//!     .task(task)              optional periodic task
//!     .interval(10s)           required when a task is set
//!     .health_check(f)         defaults to "always healthy"
//!     .restart_action(f)       awaited between stop and start on restart()
//!     .build()?
//! ```
//!
//! ## Rules
//! - `start()` while running is a no-op; `stop()` is idempotent.
//! - A service without a task never spawns anything and counts as alive.
//! - `restart()` = `stop()` + restart action + `start()`; the new context does
//!   not begin a cycle until the previous context's in-flight cycle finished.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{ConfigError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::tasks::TaskRef;

use super::runner::{LoopParams, service_loop};

/// Asynchronous health predicate.
pub type HealthCheck = Arc<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

/// Asynchronous action awaited between stop and start of a restart.
pub type RestartAction = Arc<dyn Fn() -> BoxFuture<'static, Result<(), TaskError>> + Send + Sync>;

struct Running {
    token: CancellationToken,
    join: JoinHandle<()>,
}

/// Named unit of periodic work with health and restart hooks.
pub struct Service {
    name: Arc<str>,
    task: Option<TaskRef>,
    interval: Duration,
    health_check: HealthCheck,
    restart_action: Option<RestartAction>,
    bus: Bus,
    cycle_lock: Arc<tokio::sync::Mutex<()>>,
    running: Mutex<Option<Running>>,
}

impl Service {
    /// Starts building a service with the given name.
    pub fn builder(name: impl Into<Arc<str>>) -> ServiceBuilder {
        ServiceBuilder {
            name: name.into(),
            task: None,
            interval: None,
            health_check: None,
            restart_action: None,
        }
    }

    /// Builds a task service whose interval was validated elsewhere.
    pub(crate) fn from_validated(name: &str, task: TaskRef, interval: Duration) -> Self {
        Self {
            name: name.into(),
            task: Some(task),
            interval,
            health_check: always_healthy(),
            restart_action: None,
            bus: Bus::default(),
            cycle_lock: Arc::new(tokio::sync::Mutex::new(())),
            running: Mutex::new(None),
        }
    }

    /// Service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time between the end of one cycle and the start of the next.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True if the service has a periodic task.
    pub fn has_task(&self) -> bool {
        self.task.is_some()
    }

    /// Routes this service's events to `bus`.
    pub(crate) fn attach(&mut self, bus: Bus) {
        self.bus = bus;
    }

    /// Spawns the execution context. No-op without a task or while running.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(&self) {
        let Some(task) = &self.task else {
            return;
        };
        let mut running = self.running.lock();
        if running.as_ref().is_some_and(Running::alive) {
            return;
        }

        let token = CancellationToken::new();
        let params = LoopParams {
            name: Arc::clone(&self.name),
            task: Arc::clone(task),
            interval: self.interval,
            cycle_lock: Arc::clone(&self.cycle_lock),
            bus: self.bus.clone(),
        };
        let join = tokio::spawn(service_loop(params, token.clone()));
        *running = Some(Running { token, join });
    }

    /// Requests the execution context to end after its current cycle.
    ///
    /// Idempotent; does not wait for the loop to exit (see [`Service::stopped`]).
    pub fn stop(&self) {
        let running = self.running.lock();
        let Some(r) = running.as_ref() else {
            return;
        };
        if r.token.is_cancelled() {
            return;
        }
        r.token.cancel();
        self.bus.publish(
            Event::new(EventKind::ServiceStopRequested).with_service(Arc::clone(&self.name)),
        );
    }

    /// Stops, awaits the restart action, and starts again.
    ///
    /// A failing restart action is reported and the service is started anyway.
    pub async fn restart(&self) {
        self.stop();
        if let Some(action) = &self.restart_action {
            if let Err(e) = action().await {
                self.bus.publish(
                    Event::new(EventKind::RestartActionFailed)
                        .with_service(Arc::clone(&self.name))
                        .with_error(e.to_string()),
                );
            }
        }
        self.start();
    }

    /// Health check result AND (no task OR execution context alive).
    pub async fn healthy(&self) -> bool {
        let alive = self.task.is_none() || self.is_running();
        alive && (self.health_check)().await
    }

    /// True if an execution context is alive and has not been asked to stop.
    pub fn is_running(&self) -> bool {
        self.running.lock().as_ref().is_some_and(Running::alive)
    }

    /// Waits until a stopped execution context has exited.
    ///
    /// Returns immediately if the service is running or was never started.
    pub async fn stopped(&self) {
        let join = {
            let mut running = self.running.lock();
            match running.as_ref() {
                Some(r) if r.token.is_cancelled() => running.take().map(|r| r.join),
                _ => None,
            }
        };
        if let Some(join) = join {
            let _ = join.await;
        }
    }
}

fn always_healthy() -> HealthCheck {
    Arc::new(|| async { true }.boxed())
}

impl Running {
    fn alive(&self) -> bool {
        !self.token.is_cancelled() && !self.join.is_finished()
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("has_task", &self.task.is_some())
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Builder for [`Service`].
pub struct ServiceBuilder {
    name: Arc<str>,
    task: Option<TaskRef>,
    interval: Option<Duration>,
    health_check: Option<HealthCheck>,
    restart_action: Option<RestartAction>,
}

impl ServiceBuilder {
    /// Sets the periodic task.
    pub fn task(mut self, task: TaskRef) -> Self {
        self.task = Some(task);
        self
    }

    /// Sets the time between cycles.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Sets the health predicate.
    pub fn health_check<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.health_check = Some(Arc::new(move || f().boxed()));
        self
    }

    /// Sets the action awaited between stop and start on restart.
    pub fn restart_action<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.restart_action = Some(Arc::new(move || f().boxed()));
        self
    }

    /// Validates and builds the service.
    ///
    /// # Errors
    /// [`ConfigError::InvalidInterval`] if a task is set without a positive interval.
    pub fn build(self) -> Result<Service, ConfigError> {
        let interval = self.interval.unwrap_or_default();
        if self.task.is_some() && interval.is_zero() {
            return Err(ConfigError::InvalidInterval {
                service: self.name.to_string(),
            });
        }
        Ok(Service {
            name: self.name,
            task: self.task,
            interval,
            health_check: self.health_check.unwrap_or_else(always_healthy),
            restart_action: self.restart_action,
            bus: Bus::default(),
            cycle_lock: Arc::new(tokio::sync::Mutex::new(())),
            running: Mutex::new(None),
        })
    }
}
