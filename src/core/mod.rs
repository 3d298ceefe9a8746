//! Runtime core: orchestration and lifecycle.
//!
//! Public API from this module: [`Supervisor`] with its [`SupervisorBuilder`]
//! and [`SupervisorConfig`], the [`ReadinessGate`], the [`retry`] executor and
//! the [`shutdown_token`] signal adapter.
//!
//! Internal modules:
//! - [`runner`]: runs one service, with or without restarts;
//! - [`supervisor`]: init aggregation, worker group, fail-fast, readiness;
//! - [`retry`]: retry loop with interruptible backoff sleeps;
//! - [`ready`]: re-armable readiness broadcast;
//! - [`shutdown`]: OS signals to cancellation token.

mod builder;
mod config;
mod ready;
mod retry;
mod runner;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use ready::ReadinessGate;
pub use retry::{RetryOpts, retry};
pub use shutdown::shutdown_token;
pub use supervisor::Supervisor;
