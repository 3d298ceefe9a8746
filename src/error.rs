//! Error types used by the supervisor, the retry executor and the readiness gate.
//!
//! - [`SupervisorError`] - terminal outcome of a [`Supervisor`](crate::Supervisor) run.
//! - [`InitError`] - every service initialization failure of one `init()` pass.
//! - [`RetryError`] - why the retry executor gave up.
//! - [`ContextError`] - a wait or retry was cut short by cancellation or a deadline.
//!
//! All enums provide `as_label` for logs/metrics. Wrapping never drops the
//! original error: use [`SupervisorError::find`] to look for a typed cause.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// # Errors produced by a supervisor run.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// `run` was called while another run is still in flight.
    #[error("supervisor is already started")]
    AlreadyStarted,

    /// One or more services failed to initialize; no service was started.
    #[error(transparent)]
    Init(#[from] InitError),

    /// A service's `run` failed and its restart policy (if any) gave up.
    #[error("service '{service}' crashed: {source}")]
    ServiceCrashed {
        /// Name of the failing service.
        service: String,
        /// Error returned by the service or by the retry executor.
        #[source]
        source: anyhow::Error,
    },

    /// A service panicked while running.
    #[error("service '{service}' panicked: {reason}")]
    ServicePanicked {
        /// Name of the panicking service.
        service: String,
        /// Panic payload rendered as text.
        reason: String,
    },
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servisor::SupervisorError;
    ///
    /// assert_eq!(SupervisorError::AlreadyStarted.as_label(), "supervisor_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::AlreadyStarted => "supervisor_already_started",
            SupervisorError::Init(_) => "supervisor_init_failed",
            SupervisorError::ServiceCrashed { .. } => "service_crashed",
            SupervisorError::ServicePanicked { .. } => "service_panicked",
        }
    }

    /// Name of the service this error is attributed to, if any.
    pub fn service(&self) -> Option<&str> {
        match self {
            SupervisorError::ServiceCrashed { service, .. }
            | SupervisorError::ServicePanicked { service, .. } => Some(service),
            _ => None,
        }
    }

    /// Walks the source chain (starting with `self`) and returns the first cause of type `E`.
    ///
    /// For [`SupervisorError::Init`] every collected failure is searched.
    pub fn find<E: StdError + 'static>(&self) -> Option<&E> {
        if let SupervisorError::Init(init) = self {
            return init.find::<E>();
        }
        find_in_chain(self)
    }

    /// Returns `true` if a cause of type `E` is present in the source chain.
    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.find::<E>().is_some()
    }
}

/// # Aggregate of service initialization failures.
///
/// Displays one line per failure, in service declaration order.
///
/// [`Error::source`](StdError::source) exposes the first failure, so generic
/// chain walkers (`anyhow::Error::chain`, `Error::source`) reach it. Use
/// [`InitError::failures`] or [`InitError::find`] to inspect all of them.
#[derive(Debug)]
pub struct InitError {
    failures: Vec<InitFailure>,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_failures(&self.failures))
    }
}

impl StdError for InitError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.failures
            .first()
            .map(|failure| &*failure.error as &(dyn StdError + 'static))
    }
}

/// Initialization failure of a single service.
#[derive(Debug)]
pub struct InitFailure {
    /// Name of the service whose `init` failed.
    pub service: String,
    /// Error returned by the service.
    pub error: anyhow::Error,
}

impl InitError {
    pub(crate) fn new(failures: Vec<InitFailure>) -> Self {
        Self { failures }
    }

    /// All collected failures.
    pub fn failures(&self) -> &[InitFailure] {
        &self.failures
    }

    /// Number of services that failed to initialize.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Always `false` for errors produced by the supervisor.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the first cause of type `E` across all failures.
    pub fn find<E: StdError + 'static>(&self) -> Option<&E> {
        self.failures
            .iter()
            .find_map(|f| f.error.chain().find_map(|cause| cause.downcast_ref::<E>()))
    }
}

impl fmt::Display for InitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service '{}' failed to initialize: {:#}", self.service, self.error)
    }
}

fn render_failures(failures: &[InitFailure]) -> String {
    failures
        .iter()
        .map(InitFailure::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// # Reasons the retry executor stopped.
///
/// Each variant records how many times the target was invoked.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RetryError {
    /// The target returned the configured critical error; no retry was attempted.
    #[error("critical error after {attempts} attempt(s): {source}")]
    Critical {
        /// Number of target invocations.
        attempts: u64,
        /// The matched error.
        #[source]
        source: anyhow::Error,
    },

    /// The backoff strategy ran out of retries or elapsed time.
    #[error("retries exhausted after {attempts} attempt(s): {source}")]
    Exhausted {
        /// Number of target invocations.
        attempts: u64,
        /// Error returned by the last attempt.
        #[source]
        source: anyhow::Error,
    },

    /// The context was cancelled before the target succeeded.
    #[error("retry interrupted after {attempts} attempt(s): {source}")]
    Interrupted {
        /// Number of target invocations.
        attempts: u64,
        /// The context error.
        #[source]
        source: ContextError,
    },
}

impl RetryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RetryError::Critical { .. } => "retry_critical",
            RetryError::Exhausted { .. } => "retry_exhausted",
            RetryError::Interrupted { .. } => "retry_interrupted",
        }
    }

    /// Number of times the target was invoked.
    pub fn attempts(&self) -> u64 {
        match self {
            RetryError::Critical { attempts, .. }
            | RetryError::Exhausted { attempts, .. }
            | RetryError::Interrupted { attempts, .. } => *attempts,
        }
    }
}

/// # Context termination.
///
/// Services may also return these from `run` when they stop because of cancellation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The cancellation token was cancelled.
    #[error("context canceled")]
    Canceled,
    /// The deadline passed first.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

impl ContextError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ContextError::Canceled => "context_canceled",
            ContextError::DeadlineExceeded => "context_deadline_exceeded",
        }
    }
}

fn find_in_chain<'a, E: StdError + 'static>(err: &'a (dyn StdError + 'static)) -> Option<&'a E> {
    let mut cur = Some(err);
    while let Some(cause) = cur {
        if let Some(hit) = cause.downcast_ref::<E>() {
            return Some(hit);
        }
        cur = cause.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Error, Debug, PartialEq)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn crash_keeps_the_original_cause() {
        let err = SupervisorError::ServiceCrashed {
            service: "db".into(),
            source: anyhow::Error::new(DiskFull).context("flush failed"),
        };

        assert_eq!(err.to_string(), "service 'db' crashed: flush failed");
        assert_eq!(err.service(), Some("db"));
        assert_eq!(err.find::<DiskFull>(), Some(&DiskFull));
        assert!(!err.is::<ContextError>());
    }

    #[test]
    fn crash_through_retry_error_is_searchable() {
        let retry = RetryError::Critical {
            attempts: 1,
            source: DiskFull.into(),
        };
        let err = SupervisorError::ServiceCrashed {
            service: "db".into(),
            source: retry.into(),
        };

        assert!(err.is::<RetryError>());
        assert!(err.is::<DiskFull>());
        assert_eq!(err.find::<RetryError>().map(RetryError::attempts), Some(1));
    }

    #[test]
    fn init_error_lists_every_failure() {
        let err = InitError::new(vec![
            InitFailure {
                service: "a".into(),
                error: anyhow::anyhow!("e1"),
            },
            InitFailure {
                service: "b".into(),
                error: DiskFull.into(),
            },
        ]);

        let msg = err.to_string();
        assert!(msg.contains("service 'a' failed to initialize: e1"));
        assert!(msg.contains("service 'b' failed to initialize: disk full"));
        assert_eq!(err.len(), 2);

        let wrapped = SupervisorError::from(err);
        assert_eq!(wrapped.as_label(), "supervisor_init_failed");
        assert!(wrapped.is::<DiskFull>());
    }

    #[test]
    fn init_error_chain_reaches_first_failure() {
        let err = SupervisorError::from(InitError::new(vec![
            InitFailure {
                service: "a".into(),
                error: DiskFull.into(),
            },
            InitFailure {
                service: "b".into(),
                error: anyhow::anyhow!("e2"),
            },
        ]));

        let source = StdError::source(&err).unwrap();
        assert_eq!(source.downcast_ref::<DiskFull>(), Some(&DiskFull));

        let any = anyhow::Error::from(err);
        assert!(any.chain().any(|cause| cause.is::<DiskFull>()));
    }

    #[test]
    fn interrupted_exposes_context_error() {
        let err = RetryError::Interrupted {
            attempts: 3,
            source: ContextError::Canceled,
        };
        assert_eq!(err.as_label(), "retry_interrupted");
        assert_eq!(find_in_chain::<ContextError>(&err), Some(&ContextError::Canceled));
    }
}
