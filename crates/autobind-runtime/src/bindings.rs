//! Host values that only exist once the run phase starts.

use std::any::type_name;
use std::sync::Arc;

use autobind_core::{Binder, Configuration, Environment, Module, ProvisionError, ProvisionResult};
use autobind_framework::{DeferredError, DeferredValue};
use tracing::debug;

/// Message returned when the environment is read during bootstrap.
pub const ENVIRONMENT_NOT_READY: &str = "The host environment has not yet been set. This is likely \
     caused by trying to access the host environment during the bootstrap phase.";

/// Message returned when the configuration is read during bootstrap.
pub const CONFIGURATION_NOT_READY: &str = "The configuration has not yet been set. This is likely \
     caused by trying to access the configuration during the bootstrap phase.";

/// The configuration and environment, filled in when the host runs the bundle.
pub struct HostBindings<C> {
    configuration: DeferredValue<Arc<C>>,
    environment: DeferredValue<Arc<dyn Environment>>,
}

impl<C: Configuration> HostBindings<C> {
    /// Creates empty holders.
    pub fn new() -> Self {
        Self {
            configuration: DeferredValue::new(CONFIGURATION_NOT_READY),
            environment: DeferredValue::new(ENVIRONMENT_NOT_READY),
        }
    }

    /// Stores both values. Fails if either is already set.
    pub fn set_environment_data(
        &self,
        configuration: Arc<C>,
        environment: Arc<dyn Environment>,
    ) -> Result<(), DeferredError> {
        self.configuration.set(configuration)?;
        self.environment.set(environment)?;
        debug!(configuration = type_name::<C>(), "Host bindings populated");
        Ok(())
    }

    /// The resolved configuration.
    pub fn configuration(&self) -> Result<Arc<C>, DeferredError> {
        self.configuration.cloned()
    }

    /// The live environment.
    pub fn environment(&self) -> Result<Arc<dyn Environment>, DeferredError> {
        self.environment.cloned()
    }

    /// Returns `true` once the run phase has populated the holders.
    pub fn is_populated(&self) -> bool {
        self.configuration.is_set() && self.environment.is_set()
    }
}

impl<C: Configuration> Default for HostBindings<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Binds [`HostBindings`], `dyn Environment`, `dyn Configuration` and
/// optionally `C` itself.
///
/// The environment and configuration bindings are providers over the
/// deferred holders: resolving them during bootstrap fails with the phase
/// message.
pub struct HostBindingsModule<C> {
    bindings: Arc<HostBindings<C>>,
    bind_config_type: bool,
}

impl<C: Configuration> HostBindingsModule<C> {
    pub fn new(bindings: Arc<HostBindings<C>>, bind_config_type: bool) -> Self {
        Self {
            bindings,
            bind_config_type,
        }
    }
}

impl<C: Configuration> Module for HostBindingsModule<C> {
    fn name(&self) -> &str {
        "host bindings"
    }

    fn configure(&self, binder: &mut Binder) -> ProvisionResult<()> {
        binder.bind_instance(Arc::clone(&self.bindings))?;

        let bindings = Arc::clone(&self.bindings);
        binder.bind_provider(move |_| {
            bindings
                .environment()
                .map_err(|e| ProvisionError::provider(type_name::<dyn Environment>(), e))
        })?;

        let bindings = Arc::clone(&self.bindings);
        binder.bind_provider(move |_| {
            bindings
                .configuration()
                .map(|c| c as Arc<dyn Configuration>)
                .map_err(|e| ProvisionError::provider(type_name::<dyn Configuration>(), e))
        })?;

        if self.bind_config_type {
            let bindings = Arc::clone(&self.bindings);
            binder.bind_provider(move |_| {
                bindings
                    .configuration()
                    .map_err(|e| ProvisionError::provider(type_name::<C>(), e))
            })?;
        }
        Ok(())
    }
}
