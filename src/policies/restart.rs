//! # Restart policy for services.
//!
//! [`RestartPolicy`] decides what happens when a service's `run` returns an error.
//! A clean return (`Ok(())`) is always final; the policy only applies to failures.
//!
//! ```text
//! RestartPolicy::never()                     → single attempt (default)
//! RestartPolicy::on_failure(backoff)         → retry with backoff until success,
//!     .with_max_retry(n)                       n retries spent,
//!     .with_critical(CriticalError::new(e))    critical error seen,
//!                                              max_elapsed reached or cancellation
//! ```
//!
//! `enabled = true` without a backoff policy is treated as "no restart": the
//! supervisor logs a warning and runs the service once.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::policies::backoff::BackoffPolicy;

/// Policy controlling whether a failed service is restarted.
#[derive(Clone, Debug, Default)]
pub struct RestartPolicy {
    /// Whether failed runs are restarted at all.
    pub enabled: bool,
    /// Delay strategy between restarts. Required for restarts to happen.
    pub backoff: Option<BackoffPolicy>,
    /// Errors that stop restarting immediately.
    pub critical: Option<CriticalError>,
    /// Maximum number of restarts after the first attempt (`None` or `Some(0)` = unlimited).
    pub max_retry: Option<u64>,
}

impl RestartPolicy {
    /// Never restart: the service runs once.
    pub fn never() -> Self {
        Self::default()
    }

    /// Restart on failure, waiting according to `backoff`.
    pub fn on_failure(backoff: BackoffPolicy) -> Self {
        Self {
            enabled: true,
            backoff: Some(backoff),
            ..Self::default()
        }
    }

    /// Returns a copy that stops restarting when `critical` matches.
    pub fn with_critical(mut self, critical: CriticalError) -> Self {
        self.critical = Some(critical);
        self
    }

    /// Returns a copy capped to `max_retry` restarts.
    pub fn with_max_retry(mut self, max_retry: u64) -> Self {
        self.max_retry = Some(max_retry);
        self
    }

    /// Backoff to restart with, if restarts actually apply.
    pub fn effective_backoff(&self) -> Option<BackoffPolicy> {
        self.backoff.filter(|_| self.enabled)
    }

    /// `true` when restarts are enabled but no backoff policy was given.
    pub fn is_misconfigured(&self) -> bool {
        self.enabled && self.backoff.is_none()
    }
}

type Matcher = dyn Fn(&anyhow::Error) -> bool + Send + Sync;

/// Matcher for errors that must not be retried.
///
/// Matching looks at the whole cause chain, so a sentinel wrapped with
/// `anyhow::Context` still matches.
///
/// # Example
/// ```
/// use anyhow::Context;
/// use servisor::CriticalError;
///
/// #[derive(Debug, PartialEq, thiserror::Error)]
/// #[error("license expired")]
/// struct LicenseExpired;
///
/// let critical = CriticalError::new(LicenseExpired);
/// let err = Err::<(), _>(LicenseExpired).context("startup").unwrap_err();
/// assert!(critical.matches(&err));
/// assert!(!critical.matches(&anyhow::anyhow!("transient")));
/// ```
#[derive(Clone)]
pub struct CriticalError {
    matcher: Arc<Matcher>,
}

impl CriticalError {
    /// Matches errors equal to `sentinel`.
    pub fn new<E>(sentinel: E) -> Self
    where
        E: StdError + PartialEq + Send + Sync + 'static,
    {
        Self::from_fn(move |err| {
            err.chain()
                .any(|cause| cause.downcast_ref::<E>() == Some(&sentinel))
        })
    }

    /// Matches any error of type `E`.
    pub fn kind<E>() -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::from_fn(|err| err.chain().any(|cause| cause.is::<E>()))
    }

    /// Matches errors for which `f` returns `true`.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&anyhow::Error) -> bool + Send + Sync + 'static,
    {
        Self {
            matcher: Arc::new(f),
        }
    }

    pub fn matches(&self, err: &anyhow::Error) -> bool {
        (self.matcher)(err)
    }
}

impl fmt::Debug for CriticalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CriticalError").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::time::Duration;

    #[derive(Debug, PartialEq, thiserror::Error)]
    enum StoreError {
        #[error("corrupted")]
        Corrupted,
        #[error("busy")]
        Busy,
    }

    #[test]
    fn default_never_restarts() {
        let policy = RestartPolicy::default();
        assert!(!policy.enabled);
        assert!(policy.effective_backoff().is_none());
        assert!(!policy.is_misconfigured());
    }

    #[test]
    fn enabled_without_backoff_is_misconfigured() {
        let policy = RestartPolicy {
            enabled: true,
            ..RestartPolicy::default()
        };
        assert!(policy.is_misconfigured());
        assert!(policy.effective_backoff().is_none());
    }

    #[test]
    fn disabled_policy_ignores_backoff() {
        let policy = RestartPolicy {
            enabled: false,
            backoff: Some(BackoffPolicy::constant(Duration::from_millis(1))),
            ..RestartPolicy::default()
        };
        assert!(policy.effective_backoff().is_none());
    }

    #[test]
    fn builder_methods_fill_fields() {
        let policy = RestartPolicy::on_failure(BackoffPolicy::default())
            .with_max_retry(3)
            .with_critical(CriticalError::kind::<StoreError>());
        assert!(policy.enabled);
        assert_eq!(policy.max_retry, Some(3));
        assert!(policy.critical.is_some());
        assert!(policy.effective_backoff().is_some());
    }

    #[test]
    fn sentinel_matches_by_value_through_context() {
        let critical = CriticalError::new(StoreError::Corrupted);

        let wrapped = Err::<(), _>(StoreError::Corrupted)
            .context("loading index")
            .unwrap_err();
        assert!(critical.matches(&wrapped));
        assert!(!critical.matches(&StoreError::Busy.into()));
    }

    #[test]
    fn kind_matches_any_variant() {
        let critical = CriticalError::kind::<StoreError>();
        assert!(critical.matches(&StoreError::Busy.into()));
        assert!(!critical.matches(&anyhow::anyhow!("other")));
    }

    #[test]
    fn predicate_matcher() {
        let critical = CriticalError::from_fn(|err| err.to_string().contains("fatal"));
        assert!(critical.matches(&anyhow::anyhow!("fatal: disk gone")));
        assert!(!critical.matches(&anyhow::anyhow!("retry me")));
    }
}
