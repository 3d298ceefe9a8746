//! # Scoped loggers on top of `tracing`.
//!
//! [`Logger`] is a cheap, cloneable value carrying a [`tracing::Span`] with
//! contextual fields and a debug flag. Components never build logging
//! infrastructure themselves: they receive a logger and derive scoped children
//! from it.
//!
//! ```text
//! Logger::new(debug)
//!   └─► for_app("billing")        span app{app="billing"}
//!         └─► for_service("db")   span service{service="db"}
//! ```
//!
//! `debug` messages are emitted only when the debug flag is set; the installed
//! subscriber (see [`init_tracing`]) still applies its own level filter.

use std::fmt::Display;

use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, util::TryInitError};

/// Contextual logger handed to the supervisor and to every service.
#[derive(Clone, Debug)]
pub struct Logger {
    span: Span,
    debug: bool,
}

impl Logger {
    /// Creates a root logger without contextual fields.
    pub fn new(debug: bool) -> Self {
        Self {
            span: Span::none(),
            debug,
        }
    }

    /// Derives a logger tagged with `app=<name>`.
    pub fn for_app(&self, name: &str) -> Self {
        Self {
            span: tracing::info_span!(parent: &self.span, "app", app = %name),
            debug: self.debug,
        }
    }

    /// Derives a logger tagged with `service=<name>`.
    pub fn for_service(&self, name: &str) -> Self {
        Self {
            span: tracing::info_span!(parent: &self.span, "service", service = %name),
            debug: self.debug,
        }
    }

    /// Returns a copy with the debug flag replaced.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Whether debug messages are emitted.
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// The span carrying this logger's contextual fields.
    ///
    /// Useful to instrument futures: `fut.instrument(log.span().clone())`.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn debug(&self, msg: impl Display) {
        if self.debug {
            self.span.in_scope(|| tracing::debug!("{msg}"));
        }
    }

    pub fn info(&self, msg: impl Display) {
        self.span.in_scope(|| tracing::info!("{msg}"));
    }

    pub fn warn(&self, msg: impl Display) {
        self.span.in_scope(|| tracing::warn!("{msg}"));
    }

    pub fn error(&self, msg: impl Display) {
        self.span.in_scope(|| tracing::error!("{msg}"));
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the filter is `debug` when `debug`
/// is set and `info` if not. Returns an error if a global subscriber is
/// already installed.
pub fn init_tracing(debug: bool) -> Result<(), TryInitError> {
    let fallback = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
}
