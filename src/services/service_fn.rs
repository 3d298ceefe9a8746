//! # Function-backed servicer (`ServiceFn`)
//!
//! [`ServiceFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a
//! fresh future for every run or restart. Nothing is shared between attempts
//! unless the closure captures an `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use servisor::{ServiceFn, ServicerRef};
//!
//! let svc: ServicerRef = ServiceFn::arc(|ctx: CancellationToken| async move {
//!     ctx.cancelled().await;
//!     Ok::<_, anyhow::Error>(())
//! });
//! # let _ = svc;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::services::servicer::Servicer;

/// Closure-backed servicer with a no-op `init`.
pub struct ServiceFn<F> {
    f: F,
}

impl<F> ServiceFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the servicer and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Servicer for ServiceFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken) -> anyhow::Result<()> {
        (self.f)(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn each_run_calls_the_closure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let svc = ServiceFn::arc(move |_ctx: CancellationToken| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(())
            }
        });

        svc.run(CancellationToken::new()).await.unwrap();
        svc.run(CancellationToken::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn default_init_succeeds() {
        let svc = ServiceFn::new(|_ctx: CancellationToken| async {
            Err::<(), _>(anyhow::anyhow!("boom"))
        });
        svc.init(crate::Logger::default(), None).await.unwrap();
        assert!(svc.run(CancellationToken::new()).await.is_err());
    }
}
