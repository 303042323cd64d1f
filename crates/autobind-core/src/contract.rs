//! Contracts a component can implement to be picked up by discovery.
//!
//! Each trait corresponds to one host subsystem. A component opts in by
//! implementing the trait and listing it under `contracts: [...]` in
//! [`component!`](crate::component!).

use std::any::Any;
use std::sync::Arc;

use crate::error::BoxError;
use crate::host::{Bootstrap, Environment};

/// Result of a single health check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// The checked dependency is usable.
    Healthy,
    /// The checked dependency is not usable, with a reason.
    Unhealthy(String),
}

impl HealthStatus {
    /// Returns `true` for [`HealthStatus::Healthy`].
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// A health check that carries its own registration name.
pub trait HealthCheck: Send + Sync {
    /// Name under which the check is registered.
    fn name(&self) -> &str;

    /// Runs the check.
    fn check(&self) -> HealthStatus;
}

/// An administrative task the host exposes to operators.
pub trait Task: Send + Sync {
    /// Task name, used as its admin endpoint.
    fn name(&self) -> &str;

    /// Executes the task with the request parameters.
    fn execute(&self, params: &[(String, String)]) -> Result<(), BoxError>;
}

/// An object whose start/stop is driven by the host lifecycle.
pub trait Managed: Send + Sync {
    /// Called once before the host starts serving.
    fn start(&self) -> Result<(), BoxError>;

    /// Called once after the host stops serving.
    fn stop(&self) -> Result<(), BoxError>;
}

/// A request-parameter provider for the request-handling layer.
///
/// Registered by type rather than by instance: the request layer
/// constructs it on demand through the request container.
pub trait InjectableProvider: Send + Sync + 'static {}

/// The resolved host configuration.
///
/// Implementors return themselves from [`as_any`](Configuration::as_any)
/// so the concrete type can be recovered from `Arc<dyn Configuration>`.
pub trait Configuration: Any + Send + Sync {
    /// Upcasts to `Any` for downcasting to the concrete configuration type.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A bootstrap-time extension that does not need the configuration.
pub trait Bundle: Send + Sync {
    /// Called while the host is bootstrapping.
    fn initialize(&self, bootstrap: &mut dyn Bootstrap) {
        let _ = bootstrap;
    }

    /// Called once the environment exists.
    fn run(&self, environment: Arc<dyn Environment>) -> Result<(), BoxError>;
}

/// A bootstrap-time extension that receives the resolved configuration.
pub trait ConfiguredBundle: Send + Sync {
    /// Called while the host is bootstrapping.
    fn initialize(&self, bootstrap: &mut dyn Bootstrap) -> Result<(), BoxError>;

    /// Called once the configuration is resolved and the environment exists.
    fn run(
        &self,
        configuration: Arc<dyn Configuration>,
        environment: Arc<dyn Environment>,
    ) -> Result<(), BoxError>;
}
