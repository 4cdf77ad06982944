//! # Sliding-window rate limiter.
//!
//! [`RateLimiter`] keeps the timestamps of the most recent `action_limit` actions
//! and answers whether one more action right now would stay within
//! `action_limit` actions per `timespan`.
//!
//! ## Window check
//! ```text
//! history (oldest → newest), capacity = action_limit
//!   [ t0 ][ t1 ] ... [ tN-1 ]
//!     ▲
//!     └── history[len - action_limit]
//!
//! next action allowed  ⇔  len < action_limit
//!                       ∨  now - history[len - action_limit] ≥ timespan
//! ```
//!
//! ## Rules
//! - `len(history) ≤ action_limit` at all times (oldest entry evicted first).
//! - `action_limit == 0` never admits an action and never indexes the history.
//! - Blocking is the only reaction to a reached limit: [`RateLimiter::check_next_and_wait`]
//!   sleeps in `wait_time` steps and re-checks after every sleep.
//! - Timestamps use [`tokio::time::Instant`], so a paused test clock drives the window.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::time::{self, Instant};

use super::config::RateLimit;

/// Sliding-window limiter protecting one call site.
#[derive(Debug)]
pub struct RateLimiter {
    action_limit: usize,
    timespan: Duration,
    wait_time: Duration,
    history: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Limiter admitting `action_limit` actions per `timespan`, re-checking every second.
    pub fn new(action_limit: usize, timespan: Duration) -> Self {
        Self::from(RateLimit::new(action_limit, timespan))
    }

    /// Returns the limiter with a different back-off step.
    pub fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time;
        self
    }

    /// Maximum actions per window.
    pub fn action_limit(&self) -> usize {
        self.action_limit
    }

    /// Window length.
    pub fn timespan(&self) -> Duration {
        self.timespan
    }

    /// Back-off step used while blocked.
    pub fn wait_time(&self) -> Duration {
        self.wait_time
    }

    /// Number of recorded timestamps (never above `action_limit`).
    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    /// True if no action has been recorded.
    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }

    /// True iff the recorded history, as-is, satisfies the limit.
    pub fn check_current_rate(&self) -> bool {
        let history = self.history.lock();
        self.window_open(&history, Instant::now())
    }

    /// True iff recording one more action right now would still satisfy the limit.
    pub fn check_next_rate(&self) -> bool {
        if self.action_limit == 0 {
            return false;
        }
        let history = self.history.lock();
        self.window_open(&history, Instant::now())
    }

    /// Records an action performed now.
    pub fn perform_action(&self) {
        self.add_action_timestamp(Instant::now());
    }

    /// Records an action observed by the caller at `at`.
    pub fn add_action_timestamp(&self, at: Instant) {
        let mut history = self.history.lock();
        self.push(&mut history, at);
    }

    /// Blocks the calling task until one more action would be within the limit.
    ///
    /// Sleeps in `wait_time` steps and re-checks after every step. `label`
    /// identifies the protected operation in logs.
    pub async fn check_next_and_wait(&self, label: &str) {
        while !self.check_next_rate() {
            self.log_wait(label);
            time::sleep(self.wait_time).await;
        }
    }

    /// Waits until compliant, then records the action under the same lock.
    ///
    /// Equivalent to `check_next_and_wait` followed by `perform_action`, but two
    /// concurrent callers can never both pass the check for the last free slot.
    pub async fn acquire(&self, label: &str) {
        loop {
            {
                let mut history = self.history.lock();
                let now = Instant::now();
                if self.action_limit > 0 && self.window_open(&history, now) {
                    self.push(&mut history, now);
                    return;
                }
            }
            self.log_wait(label);
            time::sleep(self.wait_time).await;
        }
    }

    /// Wraps `f` so every call first waits for this limiter and records the action.
    ///
    /// Arguments are passed as a single value (use a tuple for several). The
    /// returned callable can itself be wrapped by another limiter; each limiter
    /// enforces its own window and the strictest one governs throughput.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use std::time::Duration;
    /// use collectvisor::RateLimiter;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let per_second = Arc::new(RateLimiter::new(2, Duration::from_secs(1)));
    /// let fetch = per_second.rate_limit_decorator("fetch", |id: u32| async move { id * 2 });
    /// assert_eq!(fetch(21).await, 42);
    /// assert_eq!(per_second.len(), 1);
    /// # }
    /// ```
    pub fn rate_limit_decorator<A, F, Fut>(
        self: &Arc<Self>,
        label: impl Into<Arc<str>>,
        f: F,
    ) -> impl Fn(A) -> BoxFuture<'static, Fut::Output> + Send + Sync + 'static
    where
        A: Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send,
    {
        let limiter = Arc::clone(self);
        let label: Arc<str> = label.into();
        let f = Arc::new(f);
        move |args: A| {
            let limiter = Arc::clone(&limiter);
            let label = Arc::clone(&label);
            let f = Arc::clone(&f);
            async move {
                limiter.acquire(&label).await;
                f(args).await
            }
            .boxed()
        }
    }

    fn window_open(&self, history: &VecDeque<Instant>, now: Instant) -> bool {
        if history.len() < self.action_limit {
            return true;
        }
        match history.get(history.len() - self.action_limit) {
            Some(nth) => now.saturating_duration_since(*nth) >= self.timespan,
            // action_limit == 0 with an empty history: nothing recorded, nothing exceeded.
            None => true,
        }
    }

    fn push(&self, history: &mut VecDeque<Instant>, at: Instant) {
        history.push_back(at);
        while history.len() > self.action_limit {
            history.pop_front();
        }
    }

    fn log_wait(&self, label: &str) {
        tracing::info!(
            operation = label,
            wait = ?self.wait_time,
            limit = self.action_limit,
            timespan = ?self.timespan,
            "rate limit reached; waiting"
        );
    }
}

impl From<RateLimit> for RateLimiter {
    fn from(cfg: RateLimit) -> Self {
        Self {
            action_limit: cfg.action_limit,
            timespan: cfg.timespan,
            wait_time: cfg.wait_time,
            history: Mutex::new(VecDeque::with_capacity(cfg.action_limit)),
        }
    }
}
