//! # Ordered limiter pipeline for one call site.
//!
//! A provider usually publishes several quotas at once (e.g. 50 calls per 10 s
//! and 500 calls per hour). [`RateLimiterStack`] owns one [`RateLimiter`] per
//! quota and applies them as a fixed pipeline in registration order.
//!
//! ```text
//! call ──► limiter[0].acquire ──► limiter[1].acquire ──► ... ──► f(args)
//! ```
//!
//! The effective rate is bounded by whichever limiter is currently the tightest.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::time::Instant;

use super::{RateLimit, RateLimiter};
use crate::error::ConfigError;

/// Limiters applied in registration order.
#[derive(Clone, Debug, Default)]
pub struct RateLimiterStack {
    limiters: Vec<Arc<RateLimiter>>,
}

impl RateLimiterStack {
    /// Empty stack (admits everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one limiter per quota, validating each.
    pub fn from_limits(limits: impl IntoIterator<Item = RateLimit>) -> Result<Self, ConfigError> {
        let mut stack = Self::new();
        for limit in limits {
            limit.validate()?;
            stack.push(Arc::new(RateLimiter::from(limit)));
        }
        Ok(stack)
    }

    /// Appends a limiter at the end of the pipeline.
    pub fn push(&mut self, limiter: Arc<RateLimiter>) {
        self.limiters.push(limiter);
    }

    /// Limiters in pipeline order.
    pub fn limiters(&self) -> &[Arc<RateLimiter>] {
        &self.limiters
    }

    /// True if every limiter would admit one more action now.
    pub fn check_next_rate(&self) -> bool {
        self.limiters.iter().all(|l| l.check_next_rate())
    }

    /// Waits on every limiter in order without recording anything.
    ///
    /// Used when the caller performs the real call itself and reports back
    /// through [`RateLimiterStack::add_action_timestamp`].
    pub async fn wait_all(&self, label: &str) {
        for limiter in &self.limiters {
            limiter.check_next_and_wait(label).await;
        }
    }

    /// Records an externally performed action in every limiter.
    pub fn add_action_timestamp(&self, at: Instant) {
        for limiter in &self.limiters {
            limiter.add_action_timestamp(at);
        }
    }

    /// Acquires every limiter in order, recording the action in each.
    pub async fn acquire(&self, label: &str) {
        for limiter in &self.limiters {
            limiter.acquire(label).await;
        }
    }

    /// Wraps `f` so every call passes through the whole pipeline first.
    pub fn wrap<A, F, Fut>(
        &self,
        label: impl Into<Arc<str>>,
        f: F,
    ) -> impl Fn(A) -> BoxFuture<'static, Fut::Output> + Send + Sync + 'static
    where
        A: Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send,
    {
        let stack = self.clone();
        let label: Arc<str> = label.into();
        let f = Arc::new(f);
        move |args: A| {
            let stack = stack.clone();
            let label = Arc::clone(&label);
            let f = Arc::clone(&f);
            async move {
                stack.acquire(&label).await;
                f(args).await
            }
            .boxed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use parking_lot::Mutex;

    use crate::limiter::max_in_window;

    #[tokio::test(start_paused = true)]
    async fn stacked_decorators_never_exceed_stricter_limit() {
        let loose = Arc::new(
            RateLimiter::new(3, Duration::from_secs(1)).with_wait_time(Duration::from_millis(50)),
        );
        let strict = Arc::new(
            RateLimiter::new(2, Duration::from_secs(2)).with_wait_time(Duration::from_millis(50)),
        );

        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let inner = strict.rate_limit_decorator("inner", move |_: ()| {
            let sink = Arc::clone(&sink);
            async move { sink.lock().push(Instant::now()) }
        });
        let wrapped = loose.rate_limit_decorator("outer", inner);

        for _ in 0..10 {
            wrapped(()).await;
        }

        let calls = calls.lock().clone();
        assert_eq!(calls.len(), 10);
        assert!(max_in_window(&calls, Duration::from_secs(2)) <= 2);
        assert!(max_in_window(&calls, Duration::from_secs(1)) <= 2);
        assert!(loose.len() <= 3 && strict.len() <= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stack_wrap_applies_every_limiter() {
        let stack = RateLimiterStack::from_limits([
            RateLimit::new(2, Duration::from_secs(1)).with_wait_time(Duration::from_millis(10)),
            RateLimit::new(3, Duration::from_secs(10)).with_wait_time(Duration::from_millis(10)),
        ])
        .unwrap();
        let call = stack.wrap("noop", |_: ()| async {});

        let started = Instant::now();
        for _ in 0..4 {
            call(()).await;
        }
        // Fourth call is held back by the 3-per-10s quota.
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert!(stack.limiters().iter().all(|l| l.len() <= l.action_limit()));
    }

    #[tokio::test(start_paused = true)]
    async fn reported_timestamps_reach_all_limiters() {
        let stack = RateLimiterStack::from_limits([
            RateLimit::new(1, Duration::from_secs(1)),
            RateLimit::new(5, Duration::from_secs(60)),
        ])
        .unwrap();
        stack.wait_all("fetch").await;
        stack.add_action_timestamp(Instant::now());
        assert_eq!(stack.limiters()[0].len(), 1);
        assert_eq!(stack.limiters()[1].len(), 1);
        assert!(!stack.check_next_rate());
    }
}
