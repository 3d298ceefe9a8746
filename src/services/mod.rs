//! # Service abstractions.
//!
//! - [`Servicer`] - trait implemented by each long-lived unit (init + run)
//! - [`ServiceFn`] - closure-backed servicer
//! - [`ServicerRef`] - shared reference to a servicer (`Arc<dyn Servicer>`)
//! - [`Service`] - descriptor bundling name, servicer, dependencies and restart policy

mod service;
mod service_fn;
mod servicer;

pub use service::Service;
pub use service_fn::ServiceFn;
pub use servicer::{Dependencies, Servicer, ServicerRef};
