use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::binder::{Binder, Binding, Provision};
use super::{Injectable, Module, Stage};
use crate::component::{ComponentDescriptor, Instance, TypeKey, downcast_instance};
use crate::error::{ProvisionError, ProvisionResult};

thread_local! {
    static RESOLVING: RefCell<Vec<TypeId>> = const { RefCell::new(Vec::new()) };
}

/// Marks a type as under construction on this thread until dropped.
struct ResolveGuard;

impl ResolveGuard {
    fn enter(key: TypeKey) -> ProvisionResult<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&key.id()) {
                return Err(ProvisionError::Cycle {
                    type_name: key.name(),
                });
            }
            stack.push(key.id());
            Ok(ResolveGuard)
        })
    }
}

impl Drop for ResolveGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// The frozen binding graph.
///
/// Created once from a set of modules and read-only afterwards. Singleton
/// values are cached in place, so an `Injector` is shared as `Arc<Injector>`.
pub struct Injector {
    stage: Stage,
    bindings: HashMap<TypeKey, Binding>,
    order: Vec<TypeKey>,
}

impl Injector {
    /// Configures `modules` in order and freezes the result.
    ///
    /// Under [`Stage::Production`] every singleton is built before this
    /// returns, in declaration order.
    pub fn create(stage: Stage, modules: &[Box<dyn Module>]) -> ProvisionResult<Self> {
        let mut binder = Binder::new();
        for module in modules {
            binder.enter_module(module.name());
            module
                .configure(&mut binder)
                .map_err(|source| ProvisionError::Module {
                    module: module.name().to_string(),
                    source: Box::new(source),
                })?;
            debug!(module = module.name(), "Configured module");
        }

        let injector = Self {
            stage,
            bindings: binder.bindings,
            order: binder.order,
        };

        if stage == Stage::Production {
            for key in &injector.order {
                if let Some(binding) = injector.bindings.get(key)
                    && matches!(binding.provision, Provision::Singleton { .. })
                {
                    injector.provide(binding)?;
                }
            }
        }

        info!(
            stage = %stage,
            modules = modules.len(),
            bindings = injector.order.len(),
            "Injector created"
        );
        Ok(injector)
    }

    /// The stage this injector was created with.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns `true` if `T` has an explicit binding.
    pub fn has_binding<T: ?Sized + 'static>(&self) -> bool {
        self.bindings.contains_key(&TypeKey::of::<T>())
    }

    /// Number of explicit bindings.
    pub fn binding_count(&self) -> usize {
        self.order.len()
    }

    /// Resolves the explicit binding for `T`.
    pub fn get<T: ?Sized + 'static>(&self) -> ProvisionResult<Arc<T>> {
        let key = TypeKey::of::<T>();
        let binding = self
            .bindings
            .get(&key)
            .ok_or(ProvisionError::MissingBinding {
                type_name: key.name(),
            })?;
        let instance = self.provide(binding)?;
        downcast_instance::<T>(&instance).ok_or(ProvisionError::TypeMismatch {
            type_name: key.name(),
        })
    }

    /// Resolves `T` from its binding, or builds a fresh one if unbound.
    pub fn inject<T: Injectable>(&self) -> ProvisionResult<Arc<T>> {
        if self.has_binding::<T>() {
            return self.get::<T>();
        }
        let _guard = ResolveGuard::enter(TypeKey::of::<T>())?;
        T::inject(self).map(Arc::new)
    }

    /// Produces an instance of a discovered component.
    ///
    /// An explicit binding for the component's type wins; otherwise the
    /// descriptor constructs a new instance.
    pub fn instance_of(&self, component: &ComponentDescriptor) -> ProvisionResult<Instance> {
        let key = component.key();
        if let Some(binding) = self.bindings.get(&key) {
            return self.provide(binding);
        }
        debug!(component = component.name, "Constructing just in time");
        let _guard = ResolveGuard::enter(key)?;
        (component.construct)(self)
    }

    fn provide(&self, binding: &Binding) -> ProvisionResult<Instance> {
        match &binding.provision {
            Provision::Instance(instance) => Ok(Arc::clone(instance)),
            Provision::Provider(factory) => {
                let _guard = ResolveGuard::enter(binding.key)?;
                factory(self)
            }
            Provision::Singleton { factory, cell } => {
                if let Some(instance) = cell.get() {
                    return Ok(Arc::clone(instance));
                }
                let _guard = ResolveGuard::enter(binding.key)?;
                let built = factory(self)?;
                Ok(Arc::clone(cell.get_or_init(|| built)))
            }
        }
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("stage", &self.stage)
            .field("bindings", &self.order)
            .finish()
    }
}
