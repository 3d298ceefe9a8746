//! # Retry executor with interruptible backoff.
//!
//! Runs a fallible operation until it succeeds or the stop policy says otherwise.
//!
//! ```text
//! backoff.reset()
//! loop {
//!   ├─► attempt += 1
//!   ├─► target(ctx)
//!   │     ├─ Ok            ──► return Ok
//!   │     └─ Err(e)
//!   │          ├─ critical matches e ──► return Critical(e)
//!   │          ├─ ctx cancelled      ──► return Interrupted(Canceled)
//!   │          ├─ backoff exhausted  ──► return Exhausted(e)
//!   │          └─ sleep(delay) ─┬─ elapsed   ──► continue
//!   │                           └─ cancelled ──► return Interrupted(Canceled)
//! }
//! ```
//!
//! ## Rules
//! - Attempts run **sequentially**, never in parallel
//! - `max_retry = n > 0` allows at most `n + 1` invocations
//! - Exactly one terminal error is returned

use std::future::Future;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{ContextError, RetryError},
    logging::Logger,
    policies::{Backoff, CriticalError, MaxRetries},
};

/// Stop policy for [`retry`].
#[derive(Clone, Debug)]
pub struct RetryOpts<B> {
    /// Delay strategy between attempts; reset before the first attempt.
    pub backoff: B,
    /// Errors that end the loop without further attempts.
    pub critical: Option<CriticalError>,
    /// Maximum retries after the first attempt (`None` or `Some(0)` = unlimited).
    pub max_retry: Option<u64>,
}

impl<B: Backoff> RetryOpts<B> {
    pub fn new(backoff: B) -> Self {
        Self {
            backoff,
            critical: None,
            max_retry: None,
        }
    }

    pub fn with_critical(mut self, critical: CriticalError) -> Self {
        self.critical = Some(critical);
        self
    }

    pub fn with_max_retry(mut self, max_retry: u64) -> Self {
        self.max_retry = Some(max_retry);
        self
    }
}

/// Runs `target` with retries until success, a critical error, exhaustion of
/// the backoff strategy, or cancellation of `ctx`.
///
/// Each attempt receives a clone of `ctx`. Backoff sleeps end early when `ctx`
/// is cancelled.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use servisor::{retry, BackoffPolicy, Logger, RetryOpts};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ctx = CancellationToken::new();
/// let mut calls = 0;
/// let res = retry(
///     &ctx,
///     &Logger::default(),
///     |_ctx| {
///         calls += 1;
///         let n = calls;
///         async move {
///             if n < 3 { anyhow::bail!("not yet") }
///             Ok(())
///         }
///     },
///     RetryOpts::new(BackoffPolicy::constant(Duration::from_millis(1)).strategy()),
/// )
/// .await;
/// assert!(res.is_ok());
/// assert_eq!(calls, 3);
/// # }
/// ```
pub async fn retry<B, F, Fut>(
    ctx: &CancellationToken,
    log: &Logger,
    mut target: F,
    opts: RetryOpts<B>,
) -> Result<(), RetryError>
where
    B: Backoff,
    F: FnMut(CancellationToken) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let RetryOpts {
        backoff,
        critical,
        max_retry,
    } = opts;
    let mut backoff = MaxRetries::new(backoff, max_retry);
    backoff.reset();

    let mut attempts: u64 = 0;
    loop {
        attempts += 1;
        let err = match target(ctx.clone()).await {
            Ok(()) => {
                if attempts > 1 {
                    log.debug(format_args!("retry: succeeded after {attempts} attempts"));
                }
                return Ok(());
            }
            Err(err) => err,
        };

        if critical.as_ref().is_some_and(|c| c.matches(&err)) {
            log.debug(format_args!(
                "retry: attempt {attempts}: critical error, giving up: {err:#}"
            ));
            return Err(RetryError::Critical {
                attempts,
                source: err,
            });
        }
        if ctx.is_cancelled() {
            return Err(interrupted(attempts));
        }
        let Some(delay) = backoff.next_backoff() else {
            log.debug(format_args!(
                "retry: attempt {attempts}: backoff exhausted: {err:#}"
            ));
            return Err(RetryError::Exhausted {
                attempts,
                source: err,
            });
        };

        log.debug(format_args!(
            "retry: attempt {attempts} failed, next in {delay:?}: {err:#}"
        ));

        let sleep = time::sleep(delay);
        tokio::pin!(sleep);
        select! {
            _ = &mut sleep => {}
            _ = ctx.cancelled() => return Err(interrupted(attempts)),
        }
    }
}

fn interrupted(attempts: u64) -> RetryError {
    RetryError::Interrupted {
        attempts,
        source: ContextError::Canceled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::BackoffPolicy;
    use std::time::Duration;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("critical")]
    struct Critical;

    fn quick() -> RetryOpts<crate::ExponentialBackoff> {
        RetryOpts::new(BackoffPolicy::constant(Duration::from_millis(1)).strategy())
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_two_failures() {
        let mut calls = 0u32;
        let res = retry(
            &CancellationToken::new(),
            &Logger::default(),
            |_| {
                calls += 1;
                let n = calls;
                async move {
                    if n <= 2 {
                        anyhow::bail!("attempt {n} failed");
                    }
                    Ok(())
                }
            },
            quick().with_max_retry(3),
        )
        .await;

        assert!(res.is_ok());
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn critical_error_stops_after_one_call() {
        let mut calls = 0u32;
        let res = retry(
            &CancellationToken::new(),
            &Logger::default(),
            |_| {
                calls += 1;
                async { Err::<(), _>(anyhow::Error::from(Critical)) }
            },
            quick()
                .with_max_retry(10)
                .with_critical(CriticalError::new(Critical)),
        )
        .await;

        match res {
            Err(RetryError::Critical { attempts, source }) => {
                assert_eq!(attempts, 1);
                assert_eq!(source.downcast_ref::<Critical>(), Some(&Critical));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn non_critical_errors_keep_retrying() {
        let mut calls = 0u32;
        let res = retry(
            &CancellationToken::new(),
            &Logger::default(),
            |_| {
                calls += 1;
                async { Err::<(), _>(anyhow::anyhow!("something")) }
            },
            quick()
                .with_max_retry(1)
                .with_critical(CriticalError::new(Critical)),
        )
        .await;

        let err = res.unwrap_err();
        assert_eq!(err.as_label(), "retry_exhausted");
        assert_eq!(err.attempts(), 2);
        assert!(err.to_string().contains("something"));
        assert_eq!(calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_cap_exhausts() {
        let policy = BackoffPolicy::constant(Duration::from_millis(10))
            .with_max_elapsed(Some(Duration::from_millis(35)));
        let mut calls = 0u32;
        let res = retry(
            &CancellationToken::new(),
            &Logger::default(),
            |_| {
                calls += 1;
                async { Err::<(), _>(anyhow::anyhow!("down")) }
            },
            RetryOpts::new(policy.strategy()),
        )
        .await;

        assert!(matches!(res, Err(RetryError::Exhausted { .. })));
        // sleeps at 0, 10, 20ms; at 30ms another 10ms would pass the cap
        assert_eq!(calls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_sleep_returns_promptly() {
        let ctx = CancellationToken::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let started = time::Instant::now();
        let res = retry(
            &ctx,
            &Logger::default(),
            |_| async { Err::<(), _>(anyhow::anyhow!("down")) },
            RetryOpts::new(BackoffPolicy::constant(Duration::from_secs(60)).strategy()),
        )
        .await;

        assert!(started.elapsed() < Duration::from_millis(50));
        match res {
            Err(RetryError::Interrupted { attempts, source }) => {
                assert_eq!(attempts, 1);
                assert_eq!(source, ContextError::Canceled);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_context_still_runs_first_attempt() {
        let ctx = CancellationToken::new();
        ctx.cancel();
        let mut calls = 0u32;
        let res = retry(
            &ctx,
            &Logger::default(),
            |ctx| {
                calls += 1;
                async move {
                    assert!(ctx.is_cancelled());
                    Err::<(), _>(anyhow::Error::from(ContextError::Canceled))
                }
            },
            quick().with_max_retry(1),
        )
        .await;

        assert!(matches!(res, Err(RetryError::Interrupted { attempts: 1, .. })));
        assert_eq!(calls, 1);
    }
}
