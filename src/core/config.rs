//! # Supervisor configuration.
//!
//! [`SupervisorConfig`] carries the settings a [`Supervisor`](crate::Supervisor)
//! is created with. Per-service behavior (restart, backoff) lives on each
//! [`Service`](crate::Service) instead.

/// Settings for one supervisor instance.
///
/// ## Field semantics
/// - `name`: application name; scopes the supervisor's logger (`app` span)
/// - `debug`: enables `debug` messages on the supervisor's loggers
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Application name used as logging scope.
    pub name: String,
    /// Whether debug-level messages are emitted.
    pub debug: bool,
}

impl SupervisorConfig {
    /// Config for `name` with debug logging off.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns a copy with debug logging switched on or off.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `name = "app"`
    /// - `debug = false`
    fn default() -> Self {
        Self {
            name: "app".to_owned(),
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = SupervisorConfig::default();
        assert_eq!(cfg.name, "app");
        assert!(!cfg.debug);

        let cfg = SupervisorConfig::new("billing").with_debug(true);
        assert_eq!(cfg.name, "billing");
        assert!(cfg.debug);
    }
}
