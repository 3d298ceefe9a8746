//! # Service descriptor.
//!
//! [`Service`] binds a name to a [`Servicer`](crate::Servicer), optional
//! [`Dependencies`] and a [`RestartPolicy`]. Descriptors are plain values owned
//! by the caller; the supervisor only reads them.
//!
//! Names label logs and errors. They are not required to be unique.

use std::borrow::Cow;
use std::fmt;

use crate::policies::RestartPolicy;
use crate::services::servicer::{Dependencies, ServicerRef};

/// Describes one service to run under a [`Supervisor`](crate::Supervisor).
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use servisor::{BackoffPolicy, RestartPolicy, Service, ServiceFn};
///
/// let svc = Service::new("poller", ServiceFn::arc(|ctx: CancellationToken| async move {
///     ctx.cancelled().await;
///     Ok::<_, anyhow::Error>(())
/// }))
/// .with_restart(
///     RestartPolicy::on_failure(BackoffPolicy::exponential(
///         Duration::from_millis(50),
///         Duration::from_secs(5),
///     ))
///     .with_max_retry(10),
/// );
/// assert_eq!(svc.name(), "poller");
/// ```
#[derive(Clone)]
pub struct Service {
    name: Cow<'static, str>,
    servicer: ServicerRef,
    deps: Option<Dependencies>,
    restart: RestartPolicy,
}

impl Service {
    /// Creates a service that runs once (no restart, no dependencies).
    pub fn new(name: impl Into<Cow<'static, str>>, servicer: ServicerRef) -> Self {
        Self {
            name: name.into(),
            servicer,
            deps: None,
            restart: RestartPolicy::default(),
        }
    }

    /// Returns a new descriptor with the dependencies passed to `init`.
    pub fn with_deps(mut self, deps: Dependencies) -> Self {
        self.deps = Some(deps);
        self
    }

    /// Returns a new descriptor with updated restart policy.
    pub fn with_restart(mut self, restart: RestartPolicy) -> Self {
        self.restart = restart;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn servicer(&self) -> &ServicerRef {
        &self.servicer
    }

    pub fn deps(&self) -> Option<&Dependencies> {
        self.deps.as_ref()
    }

    pub fn restart(&self) -> &RestartPolicy {
        &self.restart
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("deps", &self.deps.is_some())
            .field("restart", &self.restart)
            .finish_non_exhaustive()
    }
}
