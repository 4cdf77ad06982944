//! # ServiceManager: member lifecycle, health maintenance, and graceful shutdown.
//!
//! The [`ServiceManager`] owns the event bus, the subscriber listener, the list
//! of member services, and an implicit *maintainer* service that sweeps member
//! health every [`ManagerConfig::health_check_interval`].
//!
//! ## Architecture
//! ```text
//! ServiceManager::builder(cfg).with_subscribers(..).with_services(..).build()?
//!
//!   members: RwLock<Vec<Arc<Service>>>      maintainer: Arc<Service>
//!       │                                        │ every health_check_interval
//!       │                                        ▼
//!       │                          check_service_health_and_restart()
//!       │                            snapshot members (read lock)
//!       └──────────────────────────► for each: healthy()? ─ yes ─► reset restarts
//!                                                        └ no  ─► policy allows?
//!                                                                  ├─ yes ─► restart()
//!                                                                  └─ no  ─► RestartLimitReached (once)
//!
//! Event flow:
//!   services / maintainer ── publish ──► Bus ──► listener ──► SubscriberSet
//!
//! Shutdown path (run_until_signal):
//!   wait_for_shutdown_signal() ─► ShutdownRequested ─► stop_services()
//!       └─► stop() everything, wait up to cfg.grace
//!             ├─ all exited  → AllStoppedWithin
//!             └─ timeout     → GraceExceeded + RuntimeError::GraceExceeded { stuck }
//! ```
//!
//! ## Rules
//! - The maintainer never sweeps itself.
//! - A sweep interrupted by shutdown restarts nothing: it stops at the next member
//!   or mid-check, and `stop_services` re-stops members once the maintainer exited.
//! - Members may be added while the maintainer is sweeping; a sweep works on a snapshot.
//! - Service names are unique within a manager.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::error::{ConfigError, RuntimeError};
use crate::events::{Bus, Event, EventKind};

use super::builder::ManagerBuilder;
use super::config::ManagerConfig;
use super::service::Service;
use super::shutdown;

/// Name of the implicit health-maintenance service.
pub const MAINTAINER: &str = "maintainer";

#[derive(Default)]
struct RestartState {
    consecutive: u32,
    limit_reported: bool,
}

/// Supervises a set of [`Service`]s.
pub struct ServiceManager {
    cfg: ManagerConfig,
    bus: Bus,
    maintainer: Arc<Service>,
    members: RwLock<Vec<Arc<Service>>>,
    restarts: Mutex<HashMap<String, RestartState>>,
    runtime_token: CancellationToken,
}

impl ServiceManager {
    /// Starts building a manager with the given configuration.
    pub fn builder(cfg: ManagerConfig) -> ManagerBuilder {
        ManagerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: ManagerConfig,
        bus: Bus,
        maintainer: Service,
        runtime_token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            bus,
            maintainer: Arc::new(maintainer),
            members: RwLock::new(Vec::new()),
            restarts: Mutex::new(HashMap::new()),
            runtime_token,
        }
    }

    /// Manager configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.cfg
    }

    /// Event bus shared by the manager and all members.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// The implicit maintainer service.
    pub fn maintainer(&self) -> &Arc<Service> {
        &self.maintainer
    }

    /// `maintainer[a, b, …]` over the current members.
    pub fn maintainer_name(&self) -> String {
        let members = self.members.read();
        let names: Vec<&str> = members.iter().map(|s| s.name()).collect();
        format!("{MAINTAINER}[{}]", names.join(", "))
    }

    /// Adds a member. The service is not started.
    ///
    /// # Errors
    /// [`ConfigError::DuplicateService`] if a member with the same name exists.
    pub fn add_service(&self, mut service: Service) -> Result<Arc<Service>, ConfigError> {
        let mut members = self.members.write();
        if service.name() == MAINTAINER || members.iter().any(|s| s.name() == service.name()) {
            return Err(ConfigError::DuplicateService {
                service: service.name().to_string(),
            });
        }
        service.attach(self.bus.clone());
        let service = Arc::new(service);
        members.push(Arc::clone(&service));
        drop(members);

        self.bus
            .publish(Event::new(EventKind::ServiceAdded).with_service(service.name()));
        Ok(service)
    }

    /// Snapshot of the current members.
    pub fn services(&self) -> Vec<Arc<Service>> {
        self.members.read().clone()
    }

    /// Looks up a member by name.
    pub fn service(&self, name: &str) -> Option<Arc<Service>> {
        self.members.read().iter().find(|s| s.name() == name).cloned()
    }

    /// Starts every member, then the maintainer.
    pub fn start_services(&self) {
        for service in self.services() {
            service.start();
        }
        self.maintainer.start();
    }

    /// Restarts every member (stop, remediation, start), pausing maintenance meanwhile.
    pub async fn restart_services(&self) {
        self.maintainer.stop();
        for service in self.services() {
            service.restart().await;
        }
        self.maintainer.start();
    }

    /// Stops the maintainer and every member, waiting up to `cfg.grace` for their loops to exit.
    ///
    /// # Errors
    /// [`RuntimeError::GraceExceeded`] with the names of services still inside a cycle.
    pub async fn stop_services(&self) -> Result<(), RuntimeError> {
        let members = self.services();
        self.maintainer.stop();
        for service in &members {
            service.stop();
        }

        let mut remaining: HashSet<String> = members.iter().map(|s| s.name().to_string()).collect();
        remaining.insert(MAINTAINER.to_string());
        let done = async {
            self.maintainer.stopped().await;
            remaining.remove(MAINTAINER);

            // A sweep that was mid-restart may have started a member again.
            for service in &members {
                service.stop();
            }
            let mut pending: FuturesUnordered<_> = members
                .iter()
                .map(|s| async move {
                    s.stopped().await;
                    s.name().to_string()
                })
                .collect();
            while let Some(name) = pending.next().await {
                remaining.remove(&name);
            }
        };
        let timed = tokio::time::timeout(self.cfg.grace, done).await;

        match timed {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let mut stuck: Vec<String> = remaining.into_iter().collect();
                stuck.sort();
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_error(stuck.join(", ")),
                );
                Err(RuntimeError::GraceExceeded {
                    grace: self.cfg.grace,
                    stuck,
                })
            }
        }
    }

    /// Starts everything, waits for a termination signal, then stops with grace.
    ///
    /// # Errors
    /// [`RuntimeError::Signal`] if signal handlers cannot be installed (services are
    /// still stopped), or [`RuntimeError::GraceExceeded`].
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        self.start_services();
        let signal = shutdown::wait_for_shutdown_signal().await;
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        let stopped = self.stop_services().await;
        signal.map_err(|e| RuntimeError::Signal(e.to_string()))?;
        stopped
    }

    /// One maintenance sweep: restarts unhealthy members within the restart policy.
    ///
    /// Returns the names of the restarted members.
    pub async fn check_service_health_and_restart(&self) -> Vec<String> {
        self.sweep(&CancellationToken::new()).await
    }

    /// Sweep run by the maintainer; ends early, restarting nothing more, once `ctx` is cancelled.
    pub(crate) async fn sweep(&self, ctx: &CancellationToken) -> Vec<String> {
        let mut restarted = Vec::new();
        for service in self.services() {
            if ctx.is_cancelled() {
                break;
            }
            let name = service.name().to_string();
            let healthy = tokio::select! {
                biased;
                _ = ctx.cancelled() => break,
                healthy = service.healthy() => healthy,
            };
            if healthy {
                self.restarts.lock().remove(&name);
                continue;
            }

            let (consecutive, report_limit) = {
                let mut restarts = self.restarts.lock();
                let state = restarts.entry(name.clone()).or_default();
                if self.cfg.restart.allows(state.consecutive) {
                    state.consecutive = state.consecutive.saturating_add(1);
                    (Some(state.consecutive), false)
                } else {
                    let first = !state.limit_reported;
                    state.limit_reported = true;
                    (None, first)
                }
            };

            let Some(consecutive) = consecutive else {
                if report_limit {
                    let reached = self
                        .restarts
                        .lock()
                        .get(&name)
                        .map_or(0, |s| s.consecutive);
                    self.bus.publish(
                        Event::new(EventKind::RestartLimitReached)
                            .with_service(name.as_str())
                            .with_restarts(reached),
                    );
                }
                continue;
            };

            self.bus.publish(
                Event::new(EventKind::ServiceUnhealthy)
                    .with_service(name.as_str())
                    .with_restarts(consecutive - 1),
            );
            self.bus.publish(
                Event::new(EventKind::ServiceRestarting)
                    .with_service(name.as_str())
                    .with_restarts(consecutive),
            );
            tokio::select! {
                biased;
                _ = ctx.cancelled() => break,
                () = service.restart() => restarted.push(name),
            }
        }
        restarted
    }
}

impl Drop for ServiceManager {
    fn drop(&mut self) {
        self.maintainer.stop();
        for service in self.members.get_mut().iter() {
            service.stop();
        }
        self.runtime_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::RestartPolicy;
    use crate::tasks::{TaskFn, TaskRef};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn idle_task() -> TaskRef {
        TaskFn::arc("idle", |_ctx| async { Ok::<(), crate::TaskError>(()) })
    }

    fn flagged(name: &str, healthy: Arc<AtomicBool>) -> Service {
        Service::builder(name)
            .task(idle_task())
            .interval(Duration::from_secs(1))
            .health_check(move || {
                let healthy = Arc::clone(&healthy);
                async move { healthy.load(Ordering::SeqCst) }
            })
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn maintainer_name_lists_members() {
        let mgr = ServiceManager::builder(ManagerConfig::default())
            .build()
            .unwrap();
        assert_eq!(mgr.maintainer_name(), "maintainer[]");
        mgr.add_service(Service::builder("a").build().unwrap()).unwrap();
        mgr.add_service(Service::builder("b").build().unwrap()).unwrap();
        assert_eq!(mgr.maintainer_name(), "maintainer[a, b]");
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let mgr = ServiceManager::builder(ManagerConfig::default())
            .build()
            .unwrap();
        mgr.add_service(Service::builder("a").build().unwrap()).unwrap();
        let err = mgr
            .add_service(Service::builder("a").build().unwrap())
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateService { service: "a".into() });
    }

    #[tokio::test(start_paused = true)]
    async fn limited_policy_stops_restarting() {
        let cfg = ManagerConfig {
            restart: RestartPolicy::Limited { max_restarts: 2 },
            ..ManagerConfig::default()
        };
        let mgr = ServiceManager::builder(cfg).build().unwrap();
        let healthy = Arc::new(AtomicBool::new(false));
        mgr.add_service(flagged("flaky", Arc::clone(&healthy))).unwrap();
        let mut rx = mgr.bus().subscribe();

        assert_eq!(mgr.check_service_health_and_restart().await, vec!["flaky"]);
        assert_eq!(mgr.check_service_health_and_restart().await, vec!["flaky"]);
        assert!(mgr.check_service_health_and_restart().await.is_empty());
        assert!(mgr.check_service_health_and_restart().await.is_empty());

        let mut limit_events = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::RestartLimitReached {
                limit_events += 1;
                assert_eq!(ev.restarts, Some(2));
            }
        }
        assert_eq!(limit_events, 1);

        healthy.store(true, Ordering::SeqCst);
        assert!(mgr.check_service_health_and_restart().await.is_empty());
        healthy.store(false, Ordering::SeqCst);
        assert_eq!(mgr.check_service_health_and_restart().await, vec!["flaky"]);

        mgr.stop_services().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn grace_exceeded_names_stuck_service() {
        let cfg = ManagerConfig {
            grace: Duration::from_secs(1),
            ..ManagerConfig::default()
        };
        let mgr = ServiceManager::builder(cfg).build().unwrap();
        let slow: TaskRef = TaskFn::arc("slow", |_ctx| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<(), crate::TaskError>(())
        });
        mgr.add_service(
            Service::builder("slow")
                .task(slow)
                .interval(Duration::from_secs(1))
                .build()
                .unwrap(),
        )
        .unwrap();

        mgr.start_services();
        tokio::time::sleep(Duration::from_millis(10)).await;
        match mgr.stop_services().await {
            Err(RuntimeError::GraceExceeded { stuck, .. }) => assert_eq!(stuck, vec!["slow"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_restart_counter_saturates() {
        let mgr = ServiceManager::builder(ManagerConfig::default()).build().unwrap();
        mgr.add_service(flagged("flaky", Arc::new(AtomicBool::new(false))))
            .unwrap();
        mgr.restarts.lock().insert(
            "flaky".into(),
            RestartState {
                consecutive: u32::MAX,
                limit_reported: false,
            },
        );

        assert_eq!(mgr.check_service_health_and_restart().await, vec!["flaky"]);
        assert_eq!(mgr.restarts.lock()["flaky"].consecutive, u32::MAX);
        mgr.stop_services().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_sweep_restarts_nothing() {
        let mgr = ServiceManager::builder(ManagerConfig::default()).build().unwrap();
        let svc = mgr
            .add_service(flagged("down", Arc::new(AtomicBool::new(false))))
            .unwrap();
        let ctx = CancellationToken::new();
        ctx.cancel();

        assert!(mgr.sweep(&ctx).await.is_empty());
        assert!(!svc.is_running());
    }
}
