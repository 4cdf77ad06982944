use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use collectvisor::{
    EventKind, MAINTAINER, ManagerConfig, Service, ServiceManager, TaskError, TaskFn, TaskRef,
};

fn counting(counter: Arc<AtomicUsize>) -> TaskRef {
    TaskFn::arc("count", move |_ctx| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), TaskError>(())
        }
    })
}

fn member(name: &str, healthy: Arc<AtomicBool>, restarts: Arc<AtomicUsize>) -> Service {
    Service::builder(name)
        .task(counting(Arc::default()))
        .interval(Duration::from_secs(1))
        .health_check(move || {
            let healthy = Arc::clone(&healthy);
            async move { healthy.load(Ordering::SeqCst) }
        })
        .restart_action(move || {
            let restarts = Arc::clone(&restarts);
            async move {
                restarts.fetch_add(1, Ordering::SeqCst);
                Ok::<(), TaskError>(())
            }
        })
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn sweep_restarts_only_unhealthy_members() {
    let (good_restarts, bad_restarts) = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));
    let manager = ServiceManager::builder(ManagerConfig::default())
        .with_services([
            member("good", Arc::new(AtomicBool::new(true)), good_restarts.clone()),
            member("bad", Arc::new(AtomicBool::new(false)), bad_restarts.clone()),
        ])
        .build()
        .unwrap();
    manager.start_services();

    let restarted = manager.check_service_health_and_restart().await;

    assert_eq!(restarted, vec!["bad"]);
    assert_eq!(good_restarts.load(Ordering::SeqCst), 0);
    assert_eq!(bad_restarts.load(Ordering::SeqCst), 1);
    assert!(manager.service("bad").unwrap().is_running());
    manager.stop_services().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn maintainer_revives_stopped_member() {
    let cfg = ManagerConfig {
        health_check_interval: Duration::from_secs(5),
        ..ManagerConfig::default()
    };
    let counter = Arc::new(AtomicUsize::new(0));
    let manager = ServiceManager::builder(cfg)
        .with_services([Service::builder("worker")
            .task(counting(counter.clone()))
            .interval(Duration::from_secs(1))
            .build()
            .unwrap()])
        .build()
        .unwrap();
    let mut rx = manager.bus().subscribe();
    manager.start_services();

    let worker = manager.service("worker").unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    worker.stop();
    assert!(!worker.healthy().await);

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(worker.healthy().await);

    let mut restarting = false;
    while let Ok(ev) = rx.try_recv() {
        if ev.kind == EventKind::ServiceRestarting && ev.service.as_deref() == Some("worker") {
            restarting = true;
        }
    }
    assert!(restarting);
    manager.stop_services().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent_and_health_tracks_lifecycle() {
    let manager = ServiceManager::builder(ManagerConfig::default())
        .build()
        .unwrap();
    let svc = manager
        .add_service(
            Service::builder("svc")
                .task(counting(Arc::default()))
                .interval(Duration::from_secs(1))
                .build()
                .unwrap(),
        )
        .unwrap();

    assert!(!svc.healthy().await);
    manager.start_services();
    assert!(svc.healthy().await);

    svc.stop();
    svc.stop();
    assert!(!svc.is_running());
    manager.stop_services().await.unwrap();
    assert!(!svc.healthy().await);
}

#[tokio::test(start_paused = true)]
async fn restart_services_restarts_every_member() {
    let (ra, rb) = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));
    let manager = ServiceManager::builder(ManagerConfig::default())
        .with_services([
            member("a", Arc::new(AtomicBool::new(true)), ra.clone()),
            member("b", Arc::new(AtomicBool::new(true)), rb.clone()),
        ])
        .build()
        .unwrap();
    assert_eq!(manager.maintainer_name(), "maintainer[a, b]");

    manager.restart_services().await;
    assert_eq!((ra.load(Ordering::SeqCst), rb.load(Ordering::SeqCst)), (1, 1));
    assert!(manager.services().iter().all(|s| s.is_running()));
    assert!(manager.maintainer().is_running());
    manager.stop_services().await.unwrap();
}

#[tokio::test]
async fn zero_health_interval_is_rejected() {
    let cfg = ManagerConfig {
        health_check_interval: Duration::ZERO,
        ..ManagerConfig::default()
    };
    assert!(ServiceManager::builder(cfg).build().is_err());
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_sweep_leaves_members_stopped() {
    let cfg = ManagerConfig {
        health_check_interval: Duration::from_secs(1),
        ..ManagerConfig::default()
    };
    let slow_check = Service::builder("a")
        .task(counting(Arc::default()))
        .interval(Duration::from_secs(1))
        .health_check(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            true
        })
        .build()
        .unwrap();
    let plain = Service::builder("b")
        .task(counting(Arc::default()))
        .interval(Duration::from_secs(1))
        .build()
        .unwrap();
    let manager = ServiceManager::builder(cfg)
        .with_services([slow_check, plain])
        .build()
        .unwrap();

    manager.start_services();
    tokio::time::sleep(Duration::from_millis(500)).await;
    manager.stop_services().await.unwrap();

    let (a, b) = (manager.service("a").unwrap(), manager.service("b").unwrap());
    assert!(!a.is_running());
    assert!(!b.is_running());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!a.is_running());
    assert!(!b.is_running());
    assert!(!manager.maintainer().is_running());
}

#[tokio::test(start_paused = true)]
async fn sweep_never_includes_maintainer() {
    let restarts = Arc::new(AtomicUsize::new(0));
    let manager = ServiceManager::builder(ManagerConfig::default())
        .with_services([member("bad", Arc::new(AtomicBool::new(false)), restarts.clone())])
        .build()
        .unwrap();
    manager.start_services();
    manager.maintainer().stop();
    manager.maintainer().stopped().await;
    assert!(!manager.maintainer().healthy().await);

    let restarted = manager.check_service_health_and_restart().await;

    assert_eq!(restarted, vec!["bad"]);
    assert!(!restarted.iter().any(|n| n == MAINTAINER));
    assert!(!manager.maintainer().is_running());
    assert_eq!(restarts.load(Ordering::SeqCst), 1);
    manager.stop_services().await.unwrap();
}
