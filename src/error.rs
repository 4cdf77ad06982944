//! Error types used by the collectvisor runtime, routers, and tasks.
//!
//! This module defines the error taxonomy of the crate:
//!
//! - [`ConfigError`]: misconfiguration detected at construction time (fatal, never retried).
//! - [`RouteError`]: a routed query could not be dispatched or answered.
//! - [`EndpointError`]: transient I/O against a read/store endpoint.
//! - [`TaskError`]: failure of one cycle of a supervised task.
//! - [`RuntimeError`]: errors raised by the supervisor itself.
//!
//! Every enum provides `as_label` (stable snake_case label for logs/metrics).
//! Rate-limit violations are never errors: they are resolved by waiting.

use std::time::Duration;
use thiserror::Error;

/// # Construction-time misconfiguration.
///
/// Raised immediately by builders and constructors; no background context is
/// ever started for a value that failed validation.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A service with a task was configured without a strictly positive interval.
    #[error("service {service:?}: task interval must be greater than zero")]
    InvalidInterval {
        /// Name of the offending service.
        service: String,
    },

    /// A service with the same name is already managed.
    #[error("service {service:?} is already managed")]
    DuplicateService {
        /// The duplicated name.
        service: String,
    },

    /// The maintainer health-check interval is zero.
    #[error("health check interval must be greater than zero")]
    InvalidHealthCheckInterval,

    /// A scheme token was registered twice in the same registry.
    #[error("scheme {scheme:?} is already registered")]
    DuplicateScheme {
        /// The scheme registered twice.
        scheme: String,
    },

    /// A scheme token is not a valid URI scheme.
    #[error("invalid scheme token {scheme:?}")]
    InvalidScheme {
        /// The rejected token.
        scheme: String,
    },

    /// Read and write identifier lists have different lengths.
    #[error("task {task:?}: {read} read identifiers but {write} write identifiers")]
    LengthMismatch {
        /// Name of the collection task.
        task: String,
        /// Number of read identifiers.
        read: usize,
        /// Number of write identifiers.
        write: usize,
    },

    /// A rate limiter was configured with a zero timespan.
    #[error("rate limit timespan must be greater than zero")]
    InvalidTimespan,

    /// A rate limiter was configured with a zero re-check step.
    #[error("rate limit wait_time must be greater than zero")]
    InvalidWaitTime,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::InvalidInterval { .. } => "config_invalid_interval",
            ConfigError::DuplicateService { .. } => "config_duplicate_service",
            ConfigError::InvalidHealthCheckInterval => "config_invalid_health_check_interval",
            ConfigError::DuplicateScheme { .. } => "config_duplicate_scheme",
            ConfigError::InvalidScheme { .. } => "config_invalid_scheme",
            ConfigError::LengthMismatch { .. } => "config_length_mismatch",
            ConfigError::InvalidTimespan => "config_invalid_timespan",
            ConfigError::InvalidWaitTime => "config_invalid_wait_time",
        }
    }
}

/// # Routing failures.
///
/// A routed call either fails before any repository is invoked (scheme
/// validation) or reports which repository failed.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The identifier has no `<scheme>://` prefix.
    #[error("identifier {id:?} has no scheme")]
    MissingScheme {
        /// The identifier as received.
        id: String,
    },

    /// No repository is registered for the scheme.
    #[error("scheme {scheme:?} does not match any registered repository: {}", known.join(", "))]
    UnknownScheme {
        /// The unknown scheme.
        scheme: String,
        /// Schemes registered in the router.
        known: Vec<String>,
    },

    /// The repository returned an error.
    #[error("repository {scheme:?} failed: {error}")]
    Repository {
        /// Scheme of the failing repository.
        scheme: String,
        /// The underlying error message.
        error: String,
    },

    /// The repository returned a different number of series than requested.
    #[error("repository {scheme:?} returned {got} series for {expected} identifiers")]
    ShortRead {
        /// Scheme of the repository.
        scheme: String,
        /// Number of identifiers sent.
        expected: usize,
        /// Number of series returned.
        got: usize,
    },
}

impl RouteError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RouteError::MissingScheme { .. } => "route_missing_scheme",
            RouteError::UnknownScheme { .. } => "route_unknown_scheme",
            RouteError::Repository { .. } => "route_repository_failed",
            RouteError::ShortRead { .. } => "route_short_read",
        }
    }
}

/// # Transient endpoint I/O errors.
///
/// Caught and logged inside running cycles; never escape a service loop.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// Nothing is listening at the address (or the host is stopped).
    #[error("endpoint {address:?} is unavailable")]
    Unavailable {
        /// The address that was contacted.
        address: String,
    },

    /// The endpoint received the request but routing it failed.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The endpoint does not implement the requested operation.
    #[error("operation {op} is not supported by {target}")]
    Unsupported {
        /// Operation name.
        op: &'static str,
        /// Endpoint or repository that refused it.
        target: String,
    },

    /// Any other failure reported by a repository or client.
    #[error("{0}")]
    Other(String),
}

impl EndpointError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EndpointError::Unavailable { .. } => "endpoint_unavailable",
            EndpointError::Route(e) => e.as_label(),
            EndpointError::Unsupported { .. } => "endpoint_unsupported",
            EndpointError::Other(_) => "endpoint_failed",
        }
    }
}

/// # Errors produced by one cycle of a supervised task.
///
/// A failed cycle is reported and the next scheduled cycle still runs.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// The cycle failed; the service keeps its schedule.
    #[error("cycle failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The cycle observed cancellation and exited early.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use collectvisor::TaskError;
    ///
    /// let err = TaskError::Fail { error: "boom".into() };
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }
}

impl From<EndpointError> for TaskError {
    fn from(e: EndpointError) -> Self {
        TaskError::Fail {
            error: e.to_string(),
        }
    }
}

/// # Errors produced by the supervisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some services were still inside a cycle.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Services that did not stop in time.
        stuck: Vec<String>,
    },

    /// Registering OS signal handlers failed.
    #[error("signal handler registration failed: {0}")]
    Signal(String),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use collectvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal_failed",
        }
    }
}
