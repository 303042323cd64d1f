use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use super::Injector;
use crate::component::{ComponentDescriptor, Instance, TypeKey};
use crate::error::{ProvisionError, ProvisionResult};

pub(super) type Factory = Arc<dyn Fn(&Injector) -> ProvisionResult<Instance> + Send + Sync>;

/// How a bound value is produced.
pub(super) enum Provision {
    /// A fixed value.
    Instance(Instance),
    /// A new value on every request.
    Provider(Factory),
    /// One value, built once.
    Singleton {
        factory: Factory,
        cell: OnceLock<Instance>,
    },
}

pub(super) struct Binding {
    pub(super) key: TypeKey,
    pub(super) module: String,
    pub(super) provision: Provision,
}

/// Collects bindings while modules are configured.
///
/// Every binding is keyed by the type it is requested as. A type may be
/// bound once across all modules.
pub struct Binder {
    pub(super) bindings: HashMap<TypeKey, Binding>,
    pub(super) order: Vec<TypeKey>,
    module: String,
}

impl Binder {
    pub(super) fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            order: Vec::new(),
            module: String::new(),
        }
    }

    pub(super) fn enter_module(&mut self, name: &str) {
        self.module = name.to_string();
    }

    /// Binds `T` to a fixed value.
    pub fn bind_instance<T>(&mut self, value: Arc<T>) -> ProvisionResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.insert(TypeKey::of::<T>(), Provision::Instance(Arc::new(value)))
    }

    /// Binds `T` to a factory called on every request.
    pub fn bind_provider<T, F>(&mut self, provider: F) -> ProvisionResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Injector) -> ProvisionResult<Arc<T>> + Send + Sync + 'static,
    {
        self.insert(
            TypeKey::of::<T>(),
            Provision::Provider(erase(provider)),
        )
    }

    /// Binds `T` to a factory called at most once.
    ///
    /// Under [`Stage::Production`](super::Stage::Production) the factory runs
    /// while the injector is created.
    pub fn bind_singleton<T, F>(&mut self, factory: F) -> ProvisionResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Injector) -> ProvisionResult<Arc<T>> + Send + Sync + 'static,
    {
        self.insert(
            TypeKey::of::<T>(),
            Provision::Singleton {
                factory: erase(factory),
                cell: OnceLock::new(),
            },
        )
    }

    /// Binds a discovered component as a singleton built by its descriptor.
    pub fn bind_component(&mut self, component: &'static ComponentDescriptor) -> ProvisionResult<()> {
        let construct = component.construct;
        self.insert(
            component.key(),
            Provision::Singleton {
                factory: Arc::new(move |injector: &Injector| construct(injector)),
                cell: OnceLock::new(),
            },
        )
    }

    fn insert(&mut self, key: TypeKey, provision: Provision) -> ProvisionResult<()> {
        if let Some(existing) = self.bindings.get(&key) {
            return Err(ProvisionError::DuplicateBinding {
                type_name: key.name(),
                previous: existing.module.clone(),
            });
        }
        debug!(binding = key.name(), module = %self.module, "Declared binding");
        self.order.push(key);
        self.bindings.insert(
            key,
            Binding {
                key,
                module: self.module.clone(),
                provision,
            },
        );
        Ok(())
    }
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("module", &self.module)
            .field("bindings", &self.order)
            .finish()
    }
}

fn erase<T, F>(factory: F) -> Factory
where
    T: ?Sized + Send + Sync + 'static,
    F: Fn(&Injector) -> ProvisionResult<Arc<T>> + Send + Sync + 'static,
{
    Arc::new(move |injector: &Injector| factory(injector).map(|value| Arc::new(value) as Instance))
}
