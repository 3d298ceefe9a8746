use crate::{
    core::{config::SupervisorConfig, supervisor::Supervisor},
    logging::Logger,
    services::Service,
};

/// Builder for constructing a [`Supervisor`] from a config, services and an optional parent logger.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    services: Vec<Service>,
    parent: Option<Logger>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            services: Vec::new(),
            parent: None,
        }
    }

    /// Enables or disables debug logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.cfg.debug = debug;
        self
    }

    /// Appends one service. Services start and initialize in the order added.
    pub fn with_service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    /// Appends several services.
    pub fn with_services(mut self, services: impl IntoIterator<Item = Service>) -> Self {
        self.services.extend(services);
        self
    }

    /// Derives the supervisor's logger from `parent` instead of a fresh root logger.
    ///
    /// The resulting logger gets an `app` span under `parent`'s span and the
    /// config's debug flag.
    pub fn with_logger(mut self, parent: Logger) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builds and returns the Supervisor instance.
    pub fn build(self) -> Supervisor {
        let parent = self.parent.unwrap_or_default();
        let log = parent.for_app(&self.cfg.name).with_debug(self.cfg.debug);
        Supervisor::new_internal(self.cfg, self.services, log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServiceFn;
    use tokio_util::sync::CancellationToken;

    fn idle(name: &'static str) -> Service {
        Service::new(
            name,
            ServiceFn::arc(|_ctx: CancellationToken| async { Ok::<_, anyhow::Error>(()) }),
        )
    }

    #[test]
    fn keeps_service_order_and_debug_flag() {
        let sup = Supervisor::builder("orders")
            .with_service(idle("a"))
            .with_services([idle("b"), idle("c")])
            .with_debug(true)
            .with_logger(Logger::new(false))
            .build();

        let names: Vec<_> = sup.services().iter().map(Service::name).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(sup.name(), "orders");
        assert!(sup.log().is_debug());
        assert!(!sup.is_running());
    }
}
