//! Rate limiting for calls against quota-bound providers.
//!
//! ## Contents
//! - [`RateLimit`] one quota (`action_limit` per `timespan`, `wait_time` back-off step)
//! - [`RateLimiter`] sliding-window limiter with blocking back-pressure and a
//!   composable call wrapper
//! - [`RateLimiterStack`] several quotas applied to one call site in order
//!
//! ## Quick wiring
//! ```text
//! Repository setup:
//!   stack = RateLimiterStack::from_limits(provider quotas)
//!   fetch = stack.wrap("fetch", raw_fetch)     (built once, stored)
//!
//! Every call:
//!   fetch(args) ─► limiter[i].acquire (sleep in wait_time steps) ─► raw_fetch(args)
//! ```

mod config;
mod rate_limiter;
mod stack;

pub use config::RateLimit;
pub use rate_limiter::RateLimiter;
pub use stack::RateLimiterStack;

/// Max number of instants falling inside any window of `span` (half-open).
#[cfg(test)]
pub(crate) fn max_in_window(calls: &[tokio::time::Instant], span: std::time::Duration) -> usize {
    calls
        .iter()
        .map(|start| {
            calls
                .iter()
                .filter(|t| **t >= *start && t.duration_since(*start) < span)
                .count()
        })
        .max()
        .unwrap_or(0)
}
