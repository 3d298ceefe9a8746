//! Restart and backoff policies.
//!
//! ## Contents
//! - [`RestartPolicy`] whether a failed service is restarted, and when to give up
//! - [`CriticalError`] errors that end restarts immediately
//! - [`BackoffPolicy`] how restart delays evolve (first / factor / max / max_elapsed + jitter)
//! - [`Backoff`] stateful delay sequence consumed by the retry executor
//! - [`JitterPolicy`] randomization strategy to avoid thundering herd
//!
//! ## Quick wiring
//! ```text
//! Service { restart: RestartPolicy { enabled, backoff, critical, max_retry } }
//!      └─► core::runner::run_service
//!           └─► core::retry::retry(ctx, target, RetryOpts {
//!                   backoff: backoff.strategy(), critical, max_retry })
//! ```

mod backoff;
mod jitter;
mod restart;

pub use backoff::{Backoff, BackoffPolicy, ExponentialBackoff, MaxRetries};
pub use jitter::JitterPolicy;
pub use restart::{CriticalError, RestartPolicy};
