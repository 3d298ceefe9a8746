//! # Service capability.
//!
//! [`Servicer`] is implemented by every long-lived unit run by the
//! [`Supervisor`](crate::Supervisor). It has no `stop` method: a service stops
//! by observing its [`CancellationToken`] and returning.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::logging::Logger;

/// Opaque dependencies handed to [`Servicer::init`]; downcast with `Arc::downcast`.
pub type Dependencies = Arc<dyn Any + Send + Sync>;

/// Shared handle to a servicer (`Arc<dyn Servicer>`).
pub type ServicerRef = Arc<dyn Servicer>;

/// # Asynchronous, cancelable service.
///
/// - `init` runs once per supervisor `init()` pass, which happens at the start
///   of every run. It may therefore be called more than once over the life of
///   a servicer.
/// - `run` returning `Ok(())` means the service stopped cleanly and is never
///   restarted. Returning an error means the service crashed; it is restarted
///   according to the service's [`RestartPolicy`](crate::RestartPolicy).
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use servisor::{Dependencies, Logger, Servicer};
///
/// struct Ticker;
///
/// #[async_trait]
/// impl Servicer for Ticker {
///     async fn init(&self, log: Logger, _deps: Option<Dependencies>) -> anyhow::Result<()> {
///         log.debug("ticker ready");
///         Ok(())
///     }
///
///     async fn run(&self, ctx: CancellationToken) -> anyhow::Result<()> {
///         ctx.cancelled().await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Servicer: Send + Sync + 'static {
    /// Prepares the service. `log` is already scoped to the service name.
    async fn init(&self, log: Logger, deps: Option<Dependencies>) -> anyhow::Result<()> {
        let _ = (log, deps);
        Ok(())
    }

    /// Runs the service until completion, failure or cancellation of `ctx`.
    async fn run(&self, ctx: CancellationToken) -> anyhow::Result<()>;
}
