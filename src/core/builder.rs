use std::sync::{Arc, Weak};

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{ConfigError, TaskError},
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
    tasks::{TaskFn, TaskRef},
};

use super::{
    config::ManagerConfig,
    manager::{MAINTAINER, ServiceManager},
    service::Service,
};

/// Builder for constructing a [`ServiceManager`].
pub struct ManagerBuilder {
    cfg: ManagerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    services: Vec<Service>,
}

impl ManagerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ManagerConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            services: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (service lifecycle, failed cycles,
    /// restarts) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds initial member services.
    pub fn with_services(mut self, services: impl IntoIterator<Item = Service>) -> Self {
        self.services.extend(services);
        self
    }

    /// Builds the manager. Nothing is started.
    ///
    /// Spawns the subscriber listener, so it must be called inside a tokio runtime.
    ///
    /// # Errors
    /// [`ConfigError::InvalidHealthCheckInterval`] or
    /// [`ConfigError::DuplicateService`].
    pub fn build(self) -> Result<Arc<ServiceManager>, ConfigError> {
        self.cfg.validate()?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = CancellationToken::new();
        spawn_listener(
            SubscriberSet::new(self.subscribers, bus.clone()),
            bus.clone(),
            runtime_token.clone(),
        );

        let interval = self.cfg.health_check_interval;
        let cfg = self.cfg;
        let manager = Arc::new_cyclic(|weak: &Weak<ServiceManager>| {
            let mut maintainer = maintainer_service(weak.clone(), interval);
            maintainer.attach(bus.clone());
            ServiceManager::new_internal(cfg, bus, maintainer, runtime_token)
        });

        for service in self.services {
            manager.add_service(service)?;
        }
        Ok(manager)
    }
}

fn maintainer_service(manager: Weak<ServiceManager>, interval: std::time::Duration) -> Service {
    let task: TaskRef = TaskFn::arc(MAINTAINER, move |ctx: CancellationToken| {
        let manager = manager.clone();
        async move {
            if let Some(manager) = manager.upgrade() {
                manager.sweep(&ctx).await;
            }
            Ok::<(), TaskError>(())
        }
    });
    Service::from_validated(MAINTAINER, task, interval)
}

/// Forwards bus events to the subscriber set until `token` is cancelled.
fn spawn_listener(set: SubscriberSet, bus: Bus, token: CancellationToken) {
    let mut rx = bus.subscribe();
    drop(bus);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                ev = rx.recv() => match ev {
                    Ok(ev) => set.emit(ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
                _ = token.cancelled() => break,
            }
        }
        set.shutdown().await;
    });
}
