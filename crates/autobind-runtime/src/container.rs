//! Request-layer integration: the container that builds request components
//! through the injector, and the filter wrapped around every request.

use std::sync::{Arc, Weak};

use autobind_core::{
    Binder, ComponentDescriptor, Injector, Instance, Module, ProvisionError, ProvisionResult,
    RequestContainer, RequestFilter, ResourceConfig, Stage,
};
use autobind_framework::{DeferredError, DeferredValue};
use tracing::{debug, info_span};

/// Name the injector filter is installed under.
pub const FILTER_NAME: &str = "Injector Filter";

/// Request container backed by the injector.
///
/// Holds the injector weakly: the bundle owns it.
pub struct InjectingContainer {
    injector: DeferredValue<Weak<Injector>>,
    resource_config: DeferredValue<ResourceConfig>,
}

impl InjectingContainer {
    pub fn new() -> Self {
        Self {
            injector: DeferredValue::new("The request container is not attached to an injector yet."),
            resource_config: DeferredValue::new(
                "The resource config has not yet been set. It is handed over when the bundle runs.",
            ),
        }
    }

    /// Points the container at `injector`.
    pub fn attach(&self, injector: &Arc<Injector>) -> Result<(), DeferredError> {
        self.injector.set(Arc::downgrade(injector))
    }

    /// Hands over the host's resource config.
    pub fn set_resource_config(&self, config: ResourceConfig) -> Result<(), DeferredError> {
        self.resource_config.set(config)
    }

    /// The host's resource config.
    pub fn resource_config(&self) -> Result<ResourceConfig, DeferredError> {
        self.resource_config.cloned()
    }
}

impl Default for InjectingContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContainer for InjectingContainer {
    fn resolve(&self, component: &'static ComponentDescriptor) -> ProvisionResult<Instance> {
        let injector = self
            .injector
            .get()
            .map_err(|e| ProvisionError::provider(component.name, e))?
            .upgrade()
            .ok_or_else(|| ProvisionError::provider(component.name, "injector has been dropped"))?;
        debug!(component = component.name, "Resolving request component");
        injector.instance_of(component)
    }
}

/// Binds the [`InjectingContainer`] as itself and as `dyn RequestContainer`.
pub struct RequestContainerModule {
    container: Arc<InjectingContainer>,
}

impl RequestContainerModule {
    pub fn new(container: Arc<InjectingContainer>) -> Self {
        Self { container }
    }
}

impl Module for RequestContainerModule {
    fn name(&self) -> &str {
        "request container"
    }

    fn configure(&self, binder: &mut Binder) -> ProvisionResult<()> {
        binder.bind_instance(Arc::clone(&self.container))?;
        binder.bind_instance(Arc::clone(&self.container) as Arc<dyn RequestContainer>)
    }
}

/// Wraps each request in a span tagged with the injector stage.
#[derive(Debug, Clone, Copy)]
pub struct InjectorFilter {
    stage: Stage,
}

impl InjectorFilter {
    pub fn new(stage: Stage) -> Self {
        Self { stage }
    }
}

impl RequestFilter for InjectorFilter {
    fn filter(&self, path: &str, next: &mut dyn FnMut()) {
        let span = info_span!("request", path, stage = %self.stage);
        let _entered = span.enter();
        next();
    }
}
