//! # Restart ceiling for unhealthy services.
//!
//! [`RestartPolicy`] decides whether the maintainer may restart a member that
//! failed its health check again.
//!
//! - [`RestartPolicy::Unbounded`] restart on every failed sweep, forever (default).
//! - [`RestartPolicy::Limited`] stop after `max_restarts` consecutive restarts
//!   without an intervening healthy sweep.
//!
//! ```text
//! sweep: unhealthy ─► restarts < ceiling ? restart, restarts += 1
//!                                        : RestartLimitReached (once), skip
//! sweep: healthy   ─► restarts = 0
//! ```

use serde::Deserialize;

/// Policy controlling how often an unhealthy service is restarted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RestartPolicy {
    /// Keep restarting on every failed sweep (best-effort forever).
    #[default]
    Unbounded,
    /// Give up after `max_restarts` consecutive restarts until the service recovers.
    Limited {
        /// Maximum consecutive restarts.
        max_restarts: u32,
    },
}

impl RestartPolicy {
    /// True if a service that has already been restarted `restarts` times in a row
    /// may be restarted once more.
    #[inline]
    pub fn allows(&self, restarts: u32) -> bool {
        match self {
            RestartPolicy::Unbounded => true,
            RestartPolicy::Limited { max_restarts } => restarts < *max_restarts,
        }
    }
}
