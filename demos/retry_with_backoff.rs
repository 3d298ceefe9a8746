//! # Example: retry_with_backoff
//!
//! A service fails twice before succeeding. Its restart policy retries with
//! exponential backoff and equal jitter; a "license revoked" error would stop
//! retries immediately.
//!
//! ## Flow
//! ```text
//! run_service("flaky")
//!   ├─► attempt 1 → Err("boom #1") → sleep ≈100ms
//!   ├─► attempt 2 → Err("boom #2") → sleep ≈200ms
//!   └─► attempt 3 → Ok(())         → supervisor returns Ok
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example retry_with_backoff
//! ```

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use servisor::{
    BackoffPolicy, CriticalError, JitterPolicy, RestartPolicy, Service, ServiceFn, Supervisor,
    init_tracing,
};
use tokio_util::sync::CancellationToken;

static ATTEMPTS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, thiserror::Error)]
#[error("license revoked")]
struct LicenseRevoked;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(true)?;

    let flaky = ServiceFn::arc(|ctx: CancellationToken| async move {
        let attempt = ATTEMPTS.fetch_add(1, Ordering::Relaxed) + 1;
        if ctx.is_cancelled() {
            return Ok(());
        }
        if attempt <= 2 {
            anyhow::bail!("boom #{attempt}");
        }
        println!("[flaky] success on attempt {attempt}");
        Ok(())
    });

    let backoff = BackoffPolicy::exponential(Duration::from_millis(100), Duration::from_secs(2))
        .with_jitter(JitterPolicy::Equal)
        .with_max_elapsed(Some(Duration::from_secs(10)));
    let restart = RestartPolicy::on_failure(backoff)
        .with_max_retry(5)
        .with_critical(CriticalError::kind::<LicenseRevoked>());

    let sup = Supervisor::builder("retry-demo")
        .with_debug(true)
        .with_service(Service::new("flaky", flaky).with_restart(restart))
        .build();

    sup.run(&CancellationToken::new()).await?;
    println!("[main] done.");
    Ok(())
}
