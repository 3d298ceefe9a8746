//! # Supervisor: initializes services, runs them concurrently, fails fast.
//!
//! The [`Supervisor`] owns an immutable list of [`Service`] descriptors, a
//! scoped [`Logger`], the running flag and the [`ReadinessGate`].
//!
//! ## Key responsibilities
//! - initialize every service sequentially and **collect** all failures
//! - run one worker per service with its restart policy
//! - cancel all siblings on the first terminal failure and report only that one
//! - signal readiness once every worker has been launched
//!
//! ## High-level architecture
//! ```text
//! run_async(ctx):
//!   running CAS false→true ──fail──► AlreadyStarted
//!   services empty?        ──yes───► closed channel (no error)
//!   init()                 ──err───► Init(InitError)
//!
//! Spawn workers:
//!   token = ctx.child_token()
//!   Service[0]  Service[1]  ...  Service[N-1]
//!       │           │                 │
//!       └──► set.spawn(drop(started); run_service(token, service).catch_unwind())
//!
//! Started barrier:
//!   started_rx.recv() == None   (every worker dropped its sender)
//!     └─► ready.set(true)       (broadcast to waiters)
//!
//! Coordinator (background):
//!   while join_next():
//!     Err(e) ──► first error? keep it, token.cancel()
//!   ready.set(false) ──► running = false ──► tx.try_send(first)  (channel closes)
//! ```
//!
//! ## Rules
//! - `init` of every service is attempted even if an earlier one failed
//! - Only the first run-time failure is reported; all workers are still awaited
//! - A service that ignores cancellation blocks completion indefinitely
//! - The running flag is owned by a `RunGuard`; dropping `run_async` before it
//!   returns aborts started workers and releases the supervisor
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use servisor::{Service, ServiceFn, Supervisor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::builder("demo")
//!         .with_service(Service::new(
//!             "ticker",
//!             ServiceFn::arc(|ctx: CancellationToken| async move {
//!                 while !ctx.is_cancelled() {
//!                     tokio::time::sleep(Duration::from_millis(5)).await;
//!                 }
//!                 Ok::<_, anyhow::Error>(())
//!             }),
//!         ))
//!         .build();
//!
//!     let ctx = CancellationToken::new();
//!     let stopper = ctx.clone();
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_millis(20)).await;
//!         stopper.cancel();
//!     });
//!
//!     sup.run(&ctx).await?;
//!     Ok(())
//! }
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;
use tokio::{
    sync::{mpsc, oneshot},
    task::{JoinError, JoinSet},
};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        builder::SupervisorBuilder, config::SupervisorConfig, ready::ReadinessGate,
        runner::run_service,
    },
    error::{ContextError, InitError, InitFailure, SupervisorError},
    logging::Logger,
    services::Service,
};

/// Runs a fixed set of services as one unit.
pub struct Supervisor {
    cfg: SupervisorConfig,
    services: Arc<[Service]>,
    log: Logger,
    running: Arc<AtomicBool>,
    ready: Arc<ReadinessGate>,
}

impl Supervisor {
    /// Creates a supervisor logging under a root logger for `cfg.name`.
    pub fn new(cfg: SupervisorConfig, services: Vec<Service>) -> Self {
        let log = Logger::new(cfg.debug).for_app(&cfg.name);
        Self::new_internal(cfg, services, log)
    }

    /// Starts a [`SupervisorBuilder`] for an application called `name`.
    pub fn builder(name: impl Into<String>) -> SupervisorBuilder {
        SupervisorBuilder::new(SupervisorConfig::new(name))
    }

    pub(crate) fn new_internal(cfg: SupervisorConfig, services: Vec<Service>, log: Logger) -> Self {
        Self {
            cfg,
            services: services.into(),
            log,
            running: Arc::new(AtomicBool::new(false)),
            ready: Arc::new(ReadinessGate::new()),
        }
    }

    /// Initializes every service, in declaration order.
    ///
    /// Each `init` gets a logger scoped to the service name and the service's
    /// dependencies. All services are attempted; failures are returned together.
    pub async fn init(&self) -> Result<(), InitError> {
        let mut failures = Vec::new();
        for svc in self.services.iter() {
            let log = self.log.for_service(svc.name());
            if let Err(error) = svc.servicer().init(log, svc.deps().cloned()).await {
                self.log.error(format_args!(
                    "init: service '{}' failed: {error:#}",
                    svc.name()
                ));
                failures.push(InitFailure {
                    service: svc.name().to_owned(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(InitError::new(failures))
        }
    }

    /// Runs all services until they finish, one fails terminally, or `ctx` is cancelled.
    ///
    /// Returns `Ok(())` when every service stopped cleanly.
    pub async fn run(&self, ctx: &CancellationToken) -> Result<(), SupervisorError> {
        let mut rx = self.run_async(ctx).await;
        match rx.recv().await {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Starts all services and returns once every worker has been launched.
    ///
    /// The returned channel yields at most one error and is then closed. A
    /// closed channel without an error means every service stopped cleanly.
    ///
    /// Dropping this future before it completes abandons the run: services
    /// already spawned are aborted and the supervisor can be run again.
    pub async fn run_async(&self, ctx: &CancellationToken) -> mpsc::Receiver<SupervisorError> {
        let (tx, rx) = mpsc::channel(1);

        let Some(guard) = RunGuard::claim(&self.running, &self.ready) else {
            self.log.warn("run: already started");
            let _ = tx.try_send(SupervisorError::AlreadyStarted);
            return rx;
        };

        if self.services.is_empty() {
            self.log.debug("run: no services, nothing to do");
            return rx;
        }

        if let Err(err) = self.init().await {
            drop(guard);
            let _ = tx.try_send(err.into());
            return rx;
        }

        let token = ctx.child_token();
        let (started_tx, mut started_rx) = mpsc::channel::<()>(1);
        let mut set = JoinSet::new();
        for svc in self.services.iter().cloned() {
            let token = token.clone();
            let log = self.log.for_service(svc.name());
            let started = started_tx.clone();

            set.spawn(async move {
                drop(started);
                match AssertUnwindSafe(run_service(&token, &svc, &log))
                    .catch_unwind()
                    .await
                {
                    Ok(res) => res,
                    Err(payload) => Err(SupervisorError::ServicePanicked {
                        service: svc.name().to_owned(),
                        reason: panic_reason(&*payload),
                    }),
                }
            });
        }
        drop(started_tx);

        // resolves with `None` once every worker has dropped its sender
        let _ = started_rx.recv().await;
        self.ready.set(true);
        self.log.info(format_args!(
            "run: started {} service(s)",
            self.services.len()
        ));

        let coordinator = Coordinator {
            set,
            token,
            log: self.log.clone(),
            guard,
        };
        tokio::spawn(coordinator.drain(tx));
        rx
    }

    /// Waits until the current run has started all services or `ctx` is cancelled.
    pub async fn wait(&self, ctx: &CancellationToken) -> Result<(), ContextError> {
        self.ready.wait(ctx).await
    }

    /// Waits until the current run has started all services, at most `timeout`.
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<(), ContextError> {
        self.ready.wait_timeout(timeout).await
    }

    /// Single-use notification fired when the current run has started all services.
    pub fn wait_signal(&self) -> oneshot::Receiver<()> {
        self.ready.wait_signal()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is(true)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn name(&self) -> &str {
        &self.cfg.name
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Logger scoped to this supervisor's application name.
    pub fn log(&self) -> &Logger {
        &self.log
    }
}

/// Claim on the running flag for one run.
///
/// Dropping it resets the readiness gate, then clears the running flag.
struct RunGuard {
    running: Arc<AtomicBool>,
    ready: Arc<ReadinessGate>,
}

impl RunGuard {
    /// Returns `None` if another run holds the flag.
    fn claim(running: &Arc<AtomicBool>, ready: &Arc<ReadinessGate>) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self {
            running: Arc::clone(running),
            ready: Arc::clone(ready),
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.ready.set(false);
        self.running.store(false, Ordering::Release);
    }
}

/// Background half of a run: drains the worker set and publishes the outcome.
struct Coordinator {
    set: JoinSet<Result<(), SupervisorError>>,
    token: CancellationToken,
    log: Logger,
    guard: RunGuard,
}

impl Coordinator {
    async fn drain(mut self, tx: mpsc::Sender<SupervisorError>) {
        let mut first: Option<SupervisorError> = None;
        while let Some(joined) = self.set.join_next().await {
            let Err(err) = joined.unwrap_or_else(|e| Err(join_failure(e))) else {
                continue;
            };
            if first.is_some() {
                self.log
                    .debug(format_args!("run: discarding later failure: {err}"));
                continue;
            }
            self.log
                .error(format_args!("run: {err}, stopping remaining services"));
            self.token.cancel();
            first = Some(err);
        }
        self.token.cancel();

        // release before publishing so a caller woken by the result can run again
        drop(self.guard);
        match first {
            Some(err) => {
                let _ = tx.try_send(err);
            }
            None => self.log.info("run: all services stopped"),
        }
    }
}

fn join_failure(err: JoinError) -> SupervisorError {
    let reason = if err.is_panic() {
        panic_reason(&*err.into_panic())
    } else {
        err.to_string()
    };
    SupervisorError::ServicePanicked {
        service: "<unknown>".to_owned(),
        reason,
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
