//! # OS signals as a cancellation token.
//!
//! [`shutdown_token`] converts termination signals into a [`CancellationToken`]
//! that can be handed to [`Supervisor::run`](crate::Supervisor::run). The
//! supervisor itself never listens for signals.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//!
//! **Other platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use tokio_util::sync::CancellationToken;

/// Returns a token cancelled on the first termination signal.
///
/// Must be called from within a Tokio runtime. Listeners are registered
/// before returning, so registration errors surface here. Cancelling the
/// token yourself stops the listener.
#[cfg(unix)]
pub fn shutdown_token() -> std::io::Result<CancellationToken> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigint.recv()  => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
            _ = trigger.cancelled() => return,
        };
        tracing::info!(signal = name, "shutdown requested");
        trigger.cancel();
    });
    Ok(token)
}

/// Returns a token cancelled on Ctrl-C.
///
/// Must be called from within a Tokio runtime. Cancelling the token yourself
/// stops the listener.
#[cfg(not(unix))]
pub fn shutdown_token() -> std::io::Result<CancellationToken> {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if let Err(err) = res {
                    tracing::warn!(error = %err, "ctrl-c listener failed");
                    return;
                }
            }
            _ = trigger.cancelled() => return,
        }
        tracing::info!(signal = "ctrl-c", "shutdown requested");
        trigger.cancel();
    });
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_starts_live_and_can_be_cancelled_manually() {
        let token = shutdown_token().unwrap();
        assert!(!token.is_cancelled());

        token.cancel();
        tokio::task::yield_now().await;
        assert!(token.is_cancelled());
    }
}
