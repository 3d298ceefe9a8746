//! # servisor
//!
//! **Servisor** runs a fixed set of long-lived async services as one unit.
//!
//! It initializes every service, runs them concurrently, restarts failed
//! ones according to per-service policies, and tears everything down on the
//! first unrecoverable failure. Callers can wait for a readiness signal once
//! all services have been launched.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Service    │   │   Service    │   │   Service    │
//!     │ (servicer #1)│   │ (servicer #2)│   │ (servicer #3)│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - running flag (CAS, rejects concurrent runs)                    │
//! │  - ReadinessGate (broadcast once all workers are launched)        │
//! │  - Logger (app span, service spans derived per service)           │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ run_service  │   │ run_service  │   │ run_service  │
//!     │ (retry loop) │   │ (single shot)│   │ (retry loop) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            └──────────────────┼──────────────────┘
//!                               ▼
//!                   ┌────────────────────────┐
//!                   │  coordinator (JoinSet) │
//!                   │  first error ─► cancel │
//!                   └───────────┬────────────┘
//!                               ▼
//!                  mpsc::Receiver<SupervisorError>
//!                     (capacity 1, then closed)
//! ```
//!
//! ### Lifecycle
//! ```text
//! run(ctx)
//!   ├─► AlreadyStarted if a run is in flight
//!   ├─► no services ─► Ok
//!   ├─► init() every service, collect failures ─► Init(InitError)
//!   ├─► spawn one worker per service, wait until all are launched
//!   ├─► readiness gate set (waiters wake up)
//!   └─► first failure cancels the rest; all workers joined
//!         └─► gate reset, running cleared, first error (or none) delivered
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Services**      | Define services as trait objects or closures.                 | [`Servicer`], [`ServiceFn`], [`Service`]    |
//! | **Policies**      | Restart with backoff, jitter, retry caps and critical errors. | [`RestartPolicy`], [`BackoffPolicy`]        |
//! | **Supervision**   | Init aggregation, fail-fast run, readiness.                   | [`Supervisor`], [`ReadinessGate`]           |
//! | **Retry**         | Standalone retry executor with cancellable sleeps.            | [`retry`], [`RetryOpts`], [`Backoff`]       |
//! | **Errors**        | Typed errors that keep the original cause.                    | [`SupervisorError`], [`RetryError`]         |
//! | **Logging**       | Scoped `tracing` loggers.                                     | [`Logger`], [`init_tracing`]                |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use servisor::{BackoffPolicy, RestartPolicy, Service, ServiceFn, Supervisor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hello = Service::new(
//!         "hello",
//!         ServiceFn::arc(|ctx: CancellationToken| async move {
//!             if ctx.is_cancelled() {
//!                 return Ok(());
//!             }
//!             println!("Hello from service!");
//!             Ok::<_, anyhow::Error>(())
//!         }),
//!     )
//!     .with_restart(RestartPolicy::on_failure(BackoffPolicy::exponential(
//!         Duration::from_millis(10),
//!         Duration::from_secs(1),
//!     )));
//!
//!     let sup = Supervisor::builder("example").with_service(hello).build();
//!     sup.run(&CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod logging;
mod policies;
mod services;

// ---- Public re-exports ----

pub use core::{
    ReadinessGate, RetryOpts, Supervisor, SupervisorBuilder, SupervisorConfig, retry,
    shutdown_token,
};
pub use error::{ContextError, InitError, InitFailure, RetryError, SupervisorError};
pub use logging::{Logger, init_tracing};
pub use policies::{
    Backoff, BackoffPolicy, CriticalError, ExponentialBackoff, JitterPolicy, MaxRetries,
    RestartPolicy,
};
pub use services::{Dependencies, Service, ServiceFn, Servicer, ServicerRef};
