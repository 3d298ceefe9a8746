//! # Jitter policy for restart delays.
//!
//! [`JitterPolicy`] spreads restart delays of services that fail together so
//! they do not hammer a shared dependency in lockstep.
//!
//! - [`JitterPolicy::None`] - exact delay
//! - [`JitterPolicy::Full`] - random in `[0, delay]`
//! - [`JitterPolicy::Equal`] - `delay/2 + random[0, delay/2]`
//! - [`JitterPolicy::Proportional`] - random in `[delay × (1 - f), delay × (1 + f)]`

use rand::Rng;
use std::time::Duration;

/// Randomization applied to each computed backoff delay.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum JitterPolicy {
    /// No jitter.
    #[default]
    None,

    /// Random delay in `[0, delay]`.
    Full,

    /// Keeps at least half of the delay: `delay/2 + random[0, delay/2]`.
    Equal,

    /// Randomizes around the delay by the given factor, clamped to `[0.0, 1.0]`.
    ///
    /// `Proportional(0.5)` turns a 1s delay into something in `[500ms, 1.5s]`.
    /// The result may exceed [`BackoffPolicy::max`](crate::BackoffPolicy::max).
    Proportional(f64),
}

impl JitterPolicy {
    /// Applies jitter to the given delay, with nanosecond resolution.
    ///
    /// Delays beyond `u64::MAX` nanoseconds (~584 years) are jittered as if
    /// they were that long.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ns = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX);
        if ns == 0 {
            return delay;
        }

        let mut rng = rand::rng();
        match *self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => Duration::from_nanos(rng.random_range(0..=ns)),
            JitterPolicy::Equal => {
                let half = ns / 2;
                Duration::from_nanos(half + rng.random_range(0..=ns - half))
            }
            JitterPolicy::Proportional(factor) => {
                let factor = if factor.is_finite() {
                    factor.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let spread = (ns as f64 * factor) as u64;
                let low = ns - spread.min(ns);
                let high = ns.saturating_add(spread);
                Duration::from_nanos(rng.random_range(low..=high))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn none_is_identity() {
        assert_eq!(JitterPolicy::None.apply(SECOND), SECOND);
        assert_eq!(JitterPolicy::default(), JitterPolicy::None);
    }

    #[test]
    fn zero_delay_stays_zero() {
        for jitter in [
            JitterPolicy::Full,
            JitterPolicy::Equal,
            JitterPolicy::Proportional(0.5),
        ] {
            assert_eq!(jitter.apply(Duration::ZERO), Duration::ZERO);
        }
    }

    #[test]
    fn bounds_hold_over_many_samples() {
        for _ in 0..200 {
            assert!(JitterPolicy::Full.apply(SECOND) <= SECOND);

            let equal = JitterPolicy::Equal.apply(SECOND);
            assert!(equal >= Duration::from_millis(500) && equal <= SECOND);

            let prop = JitterPolicy::Proportional(0.25).apply(SECOND);
            assert!(prop >= Duration::from_millis(750) && prop <= Duration::from_millis(1250));
        }
    }

    #[test]
    fn sub_millisecond_delays_are_jittered() {
        let delay = Duration::from_micros(500);
        assert!((0..100).any(|_| JitterPolicy::Full.apply(delay) != delay));
        assert!((0..100).all(|_| JitterPolicy::Full.apply(delay) <= delay));

        let delay = Duration::from_micros(1_900);
        for _ in 0..100 {
            let equal = JitterPolicy::Equal.apply(delay);
            assert!(equal >= Duration::from_micros(950) && equal <= delay);
        }
    }

    #[test]
    fn proportional_factor_is_clamped() {
        for _ in 0..100 {
            assert!(JitterPolicy::Proportional(7.0).apply(SECOND) <= Duration::from_secs(2));
        }
        assert_eq!(JitterPolicy::Proportional(f64::NAN).apply(SECOND), SECOND);
        assert_eq!(JitterPolicy::Proportional(-1.0).apply(SECOND), SECOND);
    }
}
