//! # Service loop: one execution context per running service.
//!
//! ```text
//! publish ServiceStarted
//! loop {
//!   ├─► token cancelled? ─► exit
//!   ├─► cycle += 1
//!   ├─► acquire cycle lock (cancellable)
//!   ├─► task.run(child token)  ─► Ok / Canceled      → nothing
//!   │                          ─► Err / panic        → publish CycleFailed
//!   └─► sleep(interval) (cancellable)
//! }
//! publish ServiceStopped
//! ```
//!
//! ## Rules
//! - Cycles of one service never overlap: the cycle lock is shared by every
//!   execution context the service ever spawns, so a context started by
//!   `restart()` waits for the previous context's in-flight cycle.
//! - A failing or panicking cycle never ends the loop.
//! - Cancellation is observed between cycles only; an in-flight cycle runs to completion.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::{select, sync::Mutex, time};
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::panic_message;
use crate::tasks::TaskRef;

/// Everything a loop needs, cloned out of the owning service.
pub(crate) struct LoopParams {
    pub name: Arc<str>,
    pub task: TaskRef,
    pub interval: Duration,
    pub cycle_lock: Arc<Mutex<()>>,
    pub bus: Bus,
}

/// Runs cycles every `interval` until `token` is cancelled.
pub(crate) async fn service_loop(params: LoopParams, token: CancellationToken) {
    params
        .bus
        .publish(Event::new(EventKind::ServiceStarted).with_service(Arc::clone(&params.name)));

    let mut cycles: u64 = 0;
    loop {
        if token.is_cancelled() {
            break;
        }
        if !run_cycle(&params, &token, cycles + 1).await {
            break;
        }
        cycles += 1;

        let sleep = time::sleep(params.interval);
        tokio::pin!(sleep);
        select! {
            _ = &mut sleep => {}
            _ = token.cancelled() => break,
        }
    }

    params.bus.publish(
        Event::new(EventKind::ServiceStopped)
            .with_service(Arc::clone(&params.name))
            .with_cycle(cycles),
    );
}

/// Executes one cycle; returns `false` if cancelled before the cycle could start.
async fn run_cycle(params: &LoopParams, token: &CancellationToken, cycle: u64) -> bool {
    let _guard = select! {
        guard = params.cycle_lock.lock() => guard,
        _ = token.cancelled() => return false,
    };

    let fut = params.task.run(token.child_token());
    let error = match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) | Ok(Err(TaskError::Canceled)) => return true,
        Ok(Err(e)) => e.to_string(),
        Err(panic) => format!("cycle panicked: {}", panic_message(&*panic)),
    };

    params.bus.publish(
        Event::new(EventKind::CycleFailed)
            .with_service(Arc::clone(&params.name))
            .with_cycle(cycle)
            .with_error(error),
    );
    true
}
