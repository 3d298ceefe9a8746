//! # Backoff policy and stateful backoff strategies.
//!
//! [`BackoffPolicy`] is the immutable description stored in a service's
//! [`RestartPolicy`](crate::RestartPolicy):
//! - [`BackoffPolicy::first`] the initial delay;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the per-delay cap;
//! - [`BackoffPolicy::max_elapsed`] an optional cap on total time spent retrying.
//!
//! The delay for attempt `n` is `first × factor^n`, clamped to `max`, then
//! jittered. The base is derived from the attempt number only, so jitter never
//! feeds back into later delays.
//!
//! Each retry loop needs its own state, produced by [`BackoffPolicy::strategy`]
//! as an [`ExponentialBackoff`]. Anything implementing [`Backoff`] can drive
//! the retry executor; [`MaxRetries`] caps any strategy to a number of retries.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use servisor::{Backoff, BackoffPolicy, JitterPolicy, MaxRetries};
//!
//! let policy = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//!     max_elapsed: None,
//! };
//! assert_eq!(policy.next(1), Duration::from_millis(200));
//!
//! let mut backoff = MaxRetries::new(policy.strategy(), Some(2));
//! assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(100)));
//! assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(200)));
//! assert_eq!(backoff.next_backoff(), None);
//! ```

use std::time::Duration;

use tokio::time::Instant;

use crate::policies::jitter::JitterPolicy;

/// A stateful sequence of retry delays.
///
/// `next_backoff` returning `None` means the strategy is exhausted and the
/// caller must stop retrying.
pub trait Backoff: Send {
    /// Restarts the sequence from the first delay.
    fn reset(&mut self);

    /// Returns the delay before the next attempt, or `None` once exhausted.
    fn next_backoff(&mut self) -> Option<Duration>;
}

impl<B: Backoff + ?Sized> Backoff for Box<B> {
    fn reset(&mut self) {
        (**self).reset();
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        (**self).next_backoff()
    }
}

/// Retry backoff policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Initial delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap for retries.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter applied to every delay.
    pub jitter: JitterPolicy,
    /// Stop retrying once this much time has passed since the strategy was reset
    /// (`None` = no limit).
    pub max_elapsed: Option<Duration>,
}

impl Default for BackoffPolicy {
    /// Returns a policy with:
    /// - `first = 100ms`, `factor = 1.0` (constant delay), `max = 30s`;
    /// - no jitter and no elapsed-time limit.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::None,
            max_elapsed: None,
        }
    }
}

impl BackoffPolicy {
    /// Exponential policy starting at `first`, doubling up to `max`.
    pub fn exponential(first: Duration, max: Duration) -> Self {
        Self {
            first,
            max,
            factor: 2.0,
            ..Self::default()
        }
    }

    /// Constant delay between attempts.
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            ..Self::default()
        }
    }

    /// Returns a copy with the jitter replaced.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns a copy with the elapsed-time limit replaced.
    pub fn with_max_elapsed(mut self, max_elapsed: Option<Duration>) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    /// Computes the delay for the given attempt number (0-indexed).
    ///
    /// Non-finite, negative or oversized values clamp to [`BackoffPolicy::max`].
    pub fn next(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = attempt.min(i32::MAX as u32) as i32;
        let unclamped = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !unclamped.is_finite() || unclamped < 0.0 || unclamped > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(unclamped)
        };
        self.jitter.apply(base)
    }

    /// Creates a fresh stateful strategy for one retry loop.
    pub fn strategy(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(*self)
    }
}

/// Stateful strategy produced by [`BackoffPolicy::strategy`].
///
/// Tracks the attempt number and the time since the last reset. Exhausts when
/// the next delay would push the elapsed time past `max_elapsed`.
#[derive(Clone, Debug)]
pub struct ExponentialBackoff {
    policy: BackoffPolicy,
    attempt: u32,
    started: Instant,
}

impl ExponentialBackoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            attempt: 0,
            started: Instant::now(),
        }
    }

    /// Time since the last reset.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Backoff for ExponentialBackoff {
    fn reset(&mut self) {
        self.attempt = 0;
        self.started = Instant::now();
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        let delay = self.policy.next(self.attempt);
        self.attempt = self.attempt.saturating_add(1);

        match self.policy.max_elapsed {
            Some(cap) if self.elapsed().saturating_add(delay) > cap => None,
            _ => Some(delay),
        }
    }
}

/// Caps a strategy to at most `max` retries; `None` or `Some(0)` means no cap.
#[derive(Clone, Debug)]
pub struct MaxRetries<B> {
    inner: B,
    max: Option<u64>,
    tries: u64,
}

impl<B: Backoff> MaxRetries<B> {
    pub fn new(inner: B, max: Option<u64>) -> Self {
        Self {
            inner,
            max: max.filter(|n| *n > 0),
            tries: 0,
        }
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: Backoff> Backoff for MaxRetries<B> {
    fn reset(&mut self) {
        self.tries = 0;
        self.inner.reset();
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if let Some(max) = self.max {
            if self.tries >= max {
                return None;
            }
        }
        self.tries += 1;
        self.inner.next_backoff()
    }
}
