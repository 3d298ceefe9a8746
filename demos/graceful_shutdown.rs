//! # Example: graceful_shutdown
//!
//! Two services share a dependency passed through `init`, the caller waits
//! for readiness, and Ctrl-C (or SIGTERM) stops everything.
//!
//! ## Run
//! ```bash
//! cargo run --example graceful_shutdown
//! # then press Ctrl-C
//! ```

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use servisor::{Dependencies, Logger, Service, Servicer, Supervisor, init_tracing, shutdown_token};
use tokio_util::sync::CancellationToken;

struct Settings {
    tick: Duration,
}

/// Ticks at the interval found in its dependencies.
struct Ticker {
    tick: Mutex<Duration>,
    log: Mutex<Logger>,
}

impl Ticker {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            tick: Mutex::new(Duration::from_secs(1)),
            log: Mutex::new(Logger::default()),
        })
    }
}

#[async_trait]
impl Servicer for Ticker {
    async fn init(&self, log: Logger, deps: Option<Dependencies>) -> anyhow::Result<()> {
        let settings = deps
            .and_then(|d| d.downcast::<Settings>().ok())
            .ok_or_else(|| anyhow::anyhow!("settings missing"))?;
        *self.tick.lock() = settings.tick;
        *self.log.lock() = log;
        Ok(())
    }

    async fn run(&self, ctx: CancellationToken) -> anyhow::Result<()> {
        let tick = *self.tick.lock();
        let log = self.log.lock().clone();
        let mut n = 0u64;
        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    log.info(format_args!("stopping after {n} ticks"));
                    return Ok(());
                }
                _ = tokio::time::sleep(tick) => {
                    n += 1;
                    log.info(format_args!("tick {n}"));
                }
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(false)?;

    let settings: Dependencies = Arc::new(Settings {
        tick: Duration::from_millis(500),
    });
    let sup = Arc::new(
        Supervisor::builder("shutdown-demo")
            .with_service(Service::new("fast", Ticker::new()).with_deps(settings.clone()))
            .with_service(Service::new("slow", Ticker::new()).with_deps(settings))
            .build(),
    );

    let ctx = shutdown_token()?;
    let waiter = {
        let sup = Arc::clone(&sup);
        tokio::spawn(async move {
            if sup.wait_timeout(Duration::from_secs(5)).await.is_ok() {
                sup.log().info("all services started, press Ctrl-C to stop");
            }
        })
    };

    sup.run(&ctx).await?;
    waiter.await?;
    println!("[main] stopped cleanly.");
    Ok(())
}
