//! # Readiness gate: re-armable one-shot broadcast.
//!
//! [`ReadinessGate`] holds an atomic `ready` flag and a list of single-use
//! notifications (`oneshot` senders), one per [`ReadinessGate::wait_signal`]
//! call.
//!
//! ```text
//! wait_signal() ──► ready? ──yes──► already-fired receiver
//!                     │no
//!                     ▼
//!               lock waiters ──► ready? ──yes──► already-fired receiver
//!                                  │no
//!                                  ▼
//!                            push sender, return receiver
//!
//! set(true)  ──► lock waiters ──► CAS false→true ──won──► drain, fire all
//! set(false) ──► lock waiters ──► CAS true→false          (no broadcast, re-arms the gate)
//! ```
//!
//! ## Rules
//! - Only the caller that wins the `false → true` transition broadcasts
//! - State changes and the broadcast happen under the waiters lock, so a
//!   waiter of the next cycle is never fired by the previous one
//! - A waiter registered while ready fires immediately (no missed wake-ups)
//! - The waiter list is constructed lazily, exactly once

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::ContextError;

type Waiters = Mutex<Vec<oneshot::Sender<()>>>;

/// Broadcast condition signalling that every service has been started.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    ready: AtomicBool,
    waiters: OnceLock<Waiters>,
}

impl ReadinessGate {
    /// Creates a gate in the not-ready state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the gate is ready or `ctx` is cancelled.
    pub async fn wait(&self, ctx: &CancellationToken) -> Result<(), ContextError> {
        let signal = self.wait_signal();
        tokio::select! {
            biased;
            _ = signal => Ok(()),
            _ = ctx.cancelled() => Err(ContextError::Canceled),
        }
    }

    /// Waits until the gate is ready, at most `timeout`.
    ///
    /// A zero timeout on an unset gate returns [`ContextError::DeadlineExceeded`] right away.
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<(), ContextError> {
        tokio::time::timeout(timeout, self.wait_signal())
            .await
            .map(|_| ())
            .map_err(|_| ContextError::DeadlineExceeded)
    }

    /// Returns a single-use notification that fires once the gate is ready.
    ///
    /// If the gate is already ready, the returned receiver has already fired.
    pub fn wait_signal(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        if self.ready.load(Ordering::Acquire) {
            let _ = tx.send(());
            return rx;
        }

        let mut waiters = self.waiters().lock();
        if self.ready.load(Ordering::Acquire) {
            let _ = tx.send(());
            return rx;
        }
        waiters.retain(|w| !w.is_closed());
        waiters.push(tx);
        rx
    }

    /// Sets the gate state; returns `true` if this call changed it.
    ///
    /// A `false → true` change wakes every outstanding waiter.
    pub fn set(&self, ready: bool) -> bool {
        let mut waiters = self.waiters().lock();
        let swapped = self
            .ready
            .compare_exchange(!ready, ready, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if ready && swapped {
            for tx in waiters.drain(..) {
                let _ = tx.send(());
            }
        }
        swapped
    }

    /// Checks the current state without blocking.
    pub fn is(&self, ready: bool) -> bool {
        self.ready.load(Ordering::Acquire) == ready
    }

    fn waiters(&self) -> &Waiters {
        self.waiters.get_or_init(Waiters::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn starts_not_ready_and_lazy() {
        let gate = ReadinessGate::new();
        assert!(gate.is(false));
        assert!(gate.waiters.get().is_none());

        let _rx = gate.wait_signal();
        assert!(gate.waiters.get().is_some());
    }

    #[tokio::test]
    async fn signal_after_ready_fires_immediately() {
        let gate = ReadinessGate::new();
        assert!(gate.set(true));
        assert!(gate.is(true));
        assert!(gate.wait_signal().try_recv().is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn only_one_concurrent_setter_broadcasts() {
        let gate = Arc::new(ReadinessGate::new());
        let before: Vec<_> = (0..5).map(|_| gate.wait_signal()).collect();

        let wins = Arc::new(AtomicUsize::new(0));
        let setters: Vec<_> = (0..10)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let wins = Arc::clone(&wins);
                tokio::spawn(async move {
                    if gate.set(true) {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for setter in setters {
            setter.await.unwrap();
        }
        assert_eq!(wins.load(Ordering::SeqCst), 1);

        let after: Vec<_> = (0..5).map(|_| gate.wait_signal()).collect();
        for rx in before.into_iter().chain(after) {
            tokio::time::timeout(Duration::from_secs(1), rx)
                .await
                .expect("waiter not notified")
                .unwrap();
        }
    }

    #[tokio::test]
    async fn setting_same_state_is_a_noop() {
        let gate = ReadinessGate::new();
        assert!(!gate.set(false));
        assert!(gate.set(true));
        assert!(!gate.set(true));
        assert!(gate.set(false));
        assert!(!gate.set(false));
    }

    #[tokio::test]
    async fn expired_deadline_returns_deadline_exceeded() {
        let gate = ReadinessGate::new();
        assert_eq!(
            gate.wait_timeout(Duration::ZERO).await,
            Err(ContextError::DeadlineExceeded)
        );
    }

    #[tokio::test]
    async fn cancelled_context_returns_canceled() {
        let gate = ReadinessGate::new();
        let ctx = CancellationToken::new();
        ctx.cancel();
        assert_eq!(gate.wait(&ctx).await, Err(ContextError::Canceled));
    }

    #[tokio::test]
    async fn wait_wakes_on_set() {
        let gate = Arc::new(ReadinessGate::new());
        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.wait(&CancellationToken::new()).await })
        };
        tokio::task::yield_now().await;
        gate.set(true);
        assert_eq!(waiter.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn reset_rearms_for_next_cycle() {
        let gate = ReadinessGate::new();
        gate.set(true);
        gate.set(false);

        let mut rx = gate.wait_signal();
        assert!(rx.try_recv().is_err());

        gate.set(true);
        assert!(rx.await.is_ok());
    }

    #[test]
    fn transition_is_not_visible_before_its_broadcast() {
        let gate = Arc::new(ReadinessGate::new());
        let mut rx = gate.wait_signal();

        let held = gate.waiters().lock();
        let setter = {
            let gate = Arc::clone(&gate);
            std::thread::spawn(move || gate.set(true))
        };
        std::thread::sleep(Duration::from_millis(50));
        assert!(gate.is(false));
        assert!(rx.try_recv().is_err());

        drop(held);
        assert!(setter.join().unwrap());
        assert!(gate.is(true));
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn abandoned_waiters_are_pruned() {
        let gate = ReadinessGate::new();
        for _ in 0..10 {
            drop(gate.wait_signal());
        }
        let _live = gate.wait_signal();
        assert_eq!(gate.waiters().lock().len(), 1);
    }
}
