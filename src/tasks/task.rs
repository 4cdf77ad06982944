//! # Task abstraction.
//!
//! A [`Task`] is the unit of work a [`Service`](crate::Service) runs once per cycle.
//! The common handle type is [`TaskRef`], an `Arc<dyn Task>` suitable for sharing
//! across restarts.
//!
//! A cycle receives a [`CancellationToken`]; cancellation is cooperative and an
//! in-flight cycle is never interrupted by the supervisor.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// # One cycle of periodic work.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use collectvisor::{Task, TaskError};
///
/// struct Poll;
///
/// #[async_trait]
/// impl Task for Poll {
///     fn name(&self) -> &str { "poll" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         // fetch something...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes exactly one cycle.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}
