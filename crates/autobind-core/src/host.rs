//! Interfaces of the host service runtime.
//!
//! The host owns the registries discovered components end up in. Autobind
//! only ever calls the registration side; how the host stores, starts or
//! serves what it receives is its own business. Registries take `&self`
//! because the environment is shared as `Arc<dyn Environment>` and is also
//! bound into the injector.

use std::any::Any;
use std::sync::Arc;

use crate::component::{ComponentDescriptor, Instance, TypeKey};
use crate::contract::{Bundle, ConfiguredBundle, HealthCheck, Managed, Task};
use crate::error::ProvisionResult;

/// Opaque handle to the host's request-handling configuration.
pub type ResourceConfig = Arc<dyn Any + Send + Sync>;

// =============================================================================
// Bootstrap
// =============================================================================

/// A bootstrap-time extension handed to the host.
pub enum Extension {
    /// Extension that only needs the environment.
    Simple(Arc<dyn Bundle>),
    /// Extension that also needs the resolved configuration.
    Configured(Arc<dyn ConfiguredBundle>),
}

impl std::fmt::Debug for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple(_) => f.write_str("Extension::Simple"),
            Self::Configured(_) => f.write_str("Extension::Configured"),
        }
    }
}

/// The host's bootstrap context, available before the environment exists.
pub trait Bootstrap {
    /// Registers an extension to be initialized and run by the host.
    fn add_extension(&mut self, extension: Extension);
}

// =============================================================================
// Environment registries
// =============================================================================

/// Registry of named health checks.
pub trait HealthCheckRegistry {
    /// Registers `check` under `name`.
    fn register(&self, name: &str, check: Arc<dyn HealthCheck>);
}

/// Registry of admin tasks.
pub trait TaskRegistry {
    /// Adds a task.
    fn add_task(&self, task: Arc<dyn Task>);
}

/// The host lifecycle manager.
pub trait LifecycleEnvironment {
    /// Takes ownership of starting and stopping `managed`.
    fn manage(&self, managed: Arc<dyn Managed>);
}

/// Resolves request-handling components on behalf of the request layer.
pub trait RequestContainer: Send + Sync {
    /// Produces an instance of `component` for the request layer.
    fn resolve(&self, component: &'static ComponentDescriptor) -> ProvisionResult<Instance>;
}

/// The host's request-handling surface.
pub trait RequestEnvironment {
    /// Registers an already constructed provider or resource.
    fn register_instance(&self, key: TypeKey, instance: Instance);

    /// Registers a type the request layer constructs on demand.
    fn register_type(&self, key: TypeKey);

    /// Returns the current request-handling configuration.
    fn resource_config(&self) -> ResourceConfig;

    /// Replaces the container that serves requests.
    fn replace_container(&self, container: Arc<dyn RequestContainer>);
}

/// A cross-cutting filter wrapped around every matching request.
pub trait RequestFilter: Send + Sync {
    /// Handles one request; `next` continues the chain.
    fn filter(&self, path: &str, next: &mut dyn FnMut());
}

/// Registry of request filters.
pub trait FilterEnvironment {
    /// Installs `filter` for requests matching `url_pattern`.
    fn add_filter(&self, name: &str, filter: Arc<dyn RequestFilter>, url_pattern: &str);
}

/// The live host environment, available from the run phase on.
pub trait Environment: Send + Sync + 'static {
    /// Health check registry.
    fn health_checks(&self) -> &dyn HealthCheckRegistry;

    /// Admin task registry.
    fn admin(&self) -> &dyn TaskRegistry;

    /// Lifecycle manager.
    fn lifecycle(&self) -> &dyn LifecycleEnvironment;

    /// Request-handling surface.
    fn requests(&self) -> &dyn RequestEnvironment;

    /// Request filter registry.
    fn filters(&self) -> &dyn FilterEnvironment;

    /// Context path the application is served under, e.g. `/` or `/api/`.
    fn context_path(&self) -> &str;
}
