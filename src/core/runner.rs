//! # Run one service under its restart policy.
//!
//! ```text
//! run_service(ctx, service)
//!   ├─► child = ctx.child_token()            (cancelled when run_service returns)
//!   ├─► restart.enabled && backoff? ──yes──► retry(child, servicer.run, opts)
//!   │                               └─no───► servicer.run(child)   (exactly once)
//!   └─► Err(e) ──► ServiceCrashed { service, source: e }
//! ```
//!
//! ## Rules
//! - `Ok(())` from the servicer is final, restart policy notwithstanding
//! - `enabled` without a backoff policy runs once and logs a warning
//! - The original error stays reachable through the source chain

use tokio_util::sync::CancellationToken;

use crate::{
    core::retry::{RetryOpts, retry},
    error::SupervisorError,
    logging::Logger,
    services::Service,
};

/// Runs `service` until it stops cleanly or its restart policy gives up.
pub(crate) async fn run_service(
    ctx: &CancellationToken,
    service: &Service,
    log: &Logger,
) -> Result<(), SupervisorError> {
    let child = ctx.child_token();
    let _guard = child.clone().drop_guard();

    let restart = service.restart();
    if restart.is_misconfigured() {
        log.warn(format_args!(
            "run: service '{}': restart is enabled but no backoff policy was provided, restart is skipped",
            service.name()
        ));
    }

    let servicer = service.servicer();
    let res = match restart.effective_backoff() {
        Some(policy) => {
            let opts = RetryOpts {
                backoff: policy.strategy(),
                critical: restart.critical.clone(),
                max_retry: restart.max_retry,
            };
            retry(&child, log, move |ctx| servicer.run(ctx), opts)
                .await
                .map_err(anyhow::Error::from)
        }
        None => servicer.run(child.clone()).await,
    };

    res.map_err(|source| {
        log.debug(format_args!("run: service '{}': crashed: {source:#}", service.name()));
        SupervisorError::ServiceCrashed {
            service: service.name().to_owned(),
            source,
        }
    })
}
