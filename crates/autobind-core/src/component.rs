//! Component descriptors: the static handle to a discoverable type.
//!
//! Rust has no runtime reflection, so every discoverable type describes
//! itself once through [`component!`](crate::component!). The descriptor
//! records where the type lives (its module path), which contracts it
//! implements, which markers it carries and how the injector builds it.
//!
//! # Instances
//!
//! An [`Instance`] is an `Arc<dyn Any>` holding an `Arc<T>`. Keeping the
//! inner `Arc<T>` means the same allocation can be handed out as the concrete
//! type or, through the contract cast functions, as `Arc<dyn Trait>`.

use std::any::{Any, TypeId};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::contract::{Bundle, ConfiguredBundle, HealthCheck, Managed, Task};
use crate::error::ProvisionResult;
use crate::inject::Injector;

/// A materialized component or binding value.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Wraps `value` as an [`Instance`].
pub fn instance<T: Send + Sync + 'static>(value: T) -> Instance {
    Arc::new(Arc::new(value))
}

/// Recovers the `Arc<T>` stored in `instance`.
pub fn downcast_instance<T: ?Sized + 'static>(instance: &Instance) -> Option<Arc<T>> {
    instance.downcast_ref::<Arc<T>>().map(Arc::clone)
}

// =============================================================================
// TypeKey
// =============================================================================

/// Runtime identity of a type: its `TypeId` plus a printable name.
///
/// Equality and hashing use the `TypeId` only.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key of `T`, which may be a trait object.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The `TypeId`.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

// =============================================================================
// Contracts and markers
// =============================================================================

/// Turns an [`Instance`] into the trait object of one contract.
pub type Cast<T> = fn(&Instance) -> Option<Arc<T>>;

/// The structural contracts discovery knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    HealthCheck,
    Task,
    Managed,
    InjectableProvider,
    Bundle,
    ConfiguredBundle,
}

/// A contract implemented by a component, with its cast function.
///
/// [`InjectableProvider`](crate::contract::InjectableProvider) carries no
/// cast: such components are registered by type.
#[derive(Clone, Copy)]
pub enum Contract {
    HealthCheck(Cast<dyn HealthCheck>),
    Task(Cast<dyn Task>),
    Managed(Cast<dyn Managed>),
    InjectableProvider,
    Bundle(Cast<dyn Bundle>),
    ConfiguredBundle(Cast<dyn ConfiguredBundle>),
}

impl Contract {
    /// Returns the contract kind.
    pub fn kind(&self) -> ContractKind {
        match self {
            Self::HealthCheck(_) => ContractKind::HealthCheck,
            Self::Task(_) => ContractKind::Task,
            Self::Managed(_) => ContractKind::Managed,
            Self::InjectableProvider => ContractKind::InjectableProvider,
            Self::Bundle(_) => ContractKind::Bundle,
            Self::ConfiguredBundle(_) => ContractKind::ConfiguredBundle,
        }
    }
}

impl std::fmt::Debug for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.kind())
    }
}

/// The marker kinds discovery knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// Request-layer provider.
    Provider,
    /// Request resource bound to a path.
    Path,
}

/// A marker attached to a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Provider,
    Path(&'static str),
}

impl Marker {
    /// Returns the marker kind, ignoring any argument.
    pub fn kind(&self) -> MarkerKind {
        match self {
            Self::Provider => MarkerKind::Provider,
            Self::Path(_) => MarkerKind::Path,
        }
    }
}

// =============================================================================
// ComponentDescriptor
// =============================================================================

/// Static description of one discoverable type.
///
/// Build with [`describe_component!`](crate::describe_component!) or register
/// directly with [`component!`](crate::component!).
pub struct ComponentDescriptor {
    /// Fully qualified name, `module::Type`.
    pub name: &'static str,
    /// Module the type was declared in; namespaces match against this.
    pub module_path: &'static str,
    /// Runtime identity of the type.
    pub type_key: fn() -> TypeKey,
    /// Contracts the type implements.
    pub contracts: &'static [Contract],
    /// Markers the type carries.
    pub markers: &'static [Marker],
    /// Just-in-time constructor used when no explicit binding exists.
    pub construct: fn(&Injector) -> ProvisionResult<Instance>,
}

impl ComponentDescriptor {
    /// Returns the type key.
    pub fn key(&self) -> TypeKey {
        (self.type_key)()
    }

    /// Returns `true` if the type declares contract `kind`.
    pub fn implements(&self, kind: ContractKind) -> bool {
        self.contracts.iter().any(|c| c.kind() == kind)
    }

    /// Returns `true` if the type carries a marker of `kind`.
    pub fn is_marked(&self, kind: MarkerKind) -> bool {
        self.markers.iter().any(|m| m.kind() == kind)
    }

    /// Returns the path of the `Path` marker, if any.
    pub fn path(&self) -> Option<&'static str> {
        self.markers.iter().find_map(|m| match m {
            Marker::Path(path) => Some(*path),
            Marker::Provider => None,
        })
    }

    /// Returns `true` if the type lives in `namespace` or one of its submodules.
    ///
    /// Matching is on `::` boundaries: `app::web` matches `app::web` and
    /// `app::web::users`, not `app::website`.
    pub fn in_namespace(&self, namespace: &str) -> bool {
        match self.module_path.strip_prefix(namespace) {
            Some(rest) => rest.is_empty() || rest.starts_with("::"),
            None => false,
        }
    }

    /// Views `instance` as a health check.
    pub fn health_check(&self, instance: &Instance) -> Option<Arc<dyn HealthCheck>> {
        self.contracts.iter().find_map(|c| match c {
            Contract::HealthCheck(cast) => cast(instance),
            _ => None,
        })
    }

    /// Views `instance` as a task.
    pub fn task(&self, instance: &Instance) -> Option<Arc<dyn Task>> {
        self.contracts.iter().find_map(|c| match c {
            Contract::Task(cast) => cast(instance),
            _ => None,
        })
    }

    /// Views `instance` as a managed object.
    pub fn managed(&self, instance: &Instance) -> Option<Arc<dyn Managed>> {
        self.contracts.iter().find_map(|c| match c {
            Contract::Managed(cast) => cast(instance),
            _ => None,
        })
    }

    /// Views `instance` as a bundle.
    pub fn bundle(&self, instance: &Instance) -> Option<Arc<dyn Bundle>> {
        self.contracts.iter().find_map(|c| match c {
            Contract::Bundle(cast) => cast(instance),
            _ => None,
        })
    }

    /// Views `instance` as a configured bundle.
    pub fn configured_bundle(&self, instance: &Instance) -> Option<Arc<dyn ConfiguredBundle>> {
        self.contracts.iter().find_map(|c| match c {
            Contract::ConfiguredBundle(cast) => cast(instance),
            _ => None,
        })
    }
}

impl std::fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("contracts", &self.contracts)
            .field("markers", &self.markers)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Macros
// =============================================================================

/// Builds a [`ComponentDescriptor`] for a type implementing
/// [`Injectable`](crate::inject::Injectable).
///
/// Usable in `static` position. Each listed contract is checked at compile
/// time: listing `Managed` for a type that does not implement it fails to
/// build.
///
/// ```rust,ignore
/// static CACHE: ComponentDescriptor = describe_component!(
///     CacheWarmer,
///     contracts: [Managed, HealthCheck],
/// );
///
/// static USERS: ComponentDescriptor = describe_component!(
///     UserResource,
///     markers: [Path("/users")],
/// );
/// ```
#[macro_export]
macro_rules! describe_component {
    (
        $ty:ty
        $(, contracts: [$($contract:ident),* $(,)?])?
        $(, markers: [$($marker:ident $(($arg:expr))?),* $(,)?])?
        $(,)?
    ) => {
        $crate::component::ComponentDescriptor {
            name: ::std::concat!(::std::module_path!(), "::", ::std::stringify!($ty)),
            module_path: ::std::module_path!(),
            type_key: || $crate::component::TypeKey::of::<$ty>(),
            contracts: &[$($($crate::__contract!($contract, $ty)),*)?],
            markers: &[$($($crate::component::Marker::$marker $(($arg))?),*)?],
            construct: |injector: &$crate::inject::Injector| {
                <$ty as $crate::inject::Injectable>::inject(injector)
                    .map($crate::component::instance)
            },
        }
    };
}

/// Registers a type with the link-time component table scanned by
/// [`ScannedUniverse`](crate::universe::ScannedUniverse).
///
/// Accepts the same arguments as [`describe_component!`].
///
/// ```rust,ignore
/// pub struct CacheWarmer { /* … */ }
///
/// impl Managed for CacheWarmer { /* … */ }
/// impl Injectable for CacheWarmer { /* … */ }
///
/// component!(CacheWarmer, contracts: [Managed]);
/// ```
#[macro_export]
macro_rules! component {
    ($($body:tt)*) => {
        const _: () = {
            #[$crate::__private::distributed_slice($crate::universe::COMPONENTS)]
            #[linkme(crate = $crate::__private::linkme)]
            static COMPONENT: $crate::component::ComponentDescriptor =
                $crate::describe_component!($($body)*);
        };
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __contract {
    (HealthCheck, $ty:ty) => {
        $crate::component::Contract::HealthCheck(|i: &$crate::component::Instance| {
            $crate::component::downcast_instance::<$ty>(i)
                .map(|c| c as ::std::sync::Arc<dyn $crate::contract::HealthCheck>)
        })
    };
    (Task, $ty:ty) => {
        $crate::component::Contract::Task(|i: &$crate::component::Instance| {
            $crate::component::downcast_instance::<$ty>(i)
                .map(|c| c as ::std::sync::Arc<dyn $crate::contract::Task>)
        })
    };
    (Managed, $ty:ty) => {
        $crate::component::Contract::Managed(|i: &$crate::component::Instance| {
            $crate::component::downcast_instance::<$ty>(i)
                .map(|c| c as ::std::sync::Arc<dyn $crate::contract::Managed>)
        })
    };
    (InjectableProvider, $ty:ty) => {{
        const fn assert_provider<T: $crate::contract::InjectableProvider>() {}
        assert_provider::<$ty>();
        $crate::component::Contract::InjectableProvider
    }};
    (Bundle, $ty:ty) => {
        $crate::component::Contract::Bundle(|i: &$crate::component::Instance| {
            $crate::component::downcast_instance::<$ty>(i)
                .map(|c| c as ::std::sync::Arc<dyn $crate::contract::Bundle>)
        })
    };
    (ConfiguredBundle, $ty:ty) => {
        $crate::component::Contract::ConfiguredBundle(|i: &$crate::component::Instance| {
            $crate::component::downcast_instance::<$ty>(i)
                .map(|c| c as ::std::sync::Arc<dyn $crate::contract::ConfiguredBundle>)
        })
    };
}
