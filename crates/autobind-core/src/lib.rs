//! # Autobind Core
//!
//! Building blocks shared by every autobind crate.
//!
//! ## Layers
//!
//! ### Contracts
//!
//! What a component can be:
//! - **Contracts**: traits discovery recognizes ([`HealthCheck`], [`Task`], [`Managed`],
//!   [`InjectableProvider`], [`Bundle`], [`ConfiguredBundle`])
//! - **Host interfaces**: the registries components are handed to ([`Bootstrap`],
//!   [`Environment`])
//!
//! ### Components
//!
//! How a component is found:
//! - **Descriptors**: static metadata per type ([`ComponentDescriptor`])
//! - **Registration**: the [`component!`] macro and the link-time [`COMPONENTS`] table
//! - **Universe**: namespace-scoped queries ([`TypeUniverse`], [`ScannedUniverse`],
//!   [`StaticUniverse`])
//!
//! ### Injection
//!
//! How a component is built:
//! - **Bindings**: [`Module`] and [`Binder`]
//! - **Graph**: [`Injector`], with [`Stage`]-dependent singleton construction
//!
//! ## Example
//!
//! ```rust,ignore
//! use autobind_core::prelude::*;
//!
//! pub struct DatabaseHealth {
//!     pool: Arc<Pool>,
//! }
//!
//! impl HealthCheck for DatabaseHealth {
//!     fn name(&self) -> &str {
//!         "database"
//!     }
//!
//!     fn check(&self) -> HealthStatus {
//!         if self.pool.ping() {
//!             HealthStatus::Healthy
//!         } else {
//!             HealthStatus::Unhealthy("ping failed".into())
//!         }
//!     }
//! }
//!
//! impl Injectable for DatabaseHealth {
//!     fn inject(injector: &Injector) -> ProvisionResult<Self> {
//!         Ok(Self { pool: injector.get::<Pool>()? })
//!     }
//! }
//!
//! autobind_core::component!(DatabaseHealth, contracts: [HealthCheck]);
//! ```

pub mod component;
pub mod contract;
pub mod error;
pub mod host;
pub mod inject;
pub mod universe;

pub use component::{
    Cast, ComponentDescriptor, Contract, ContractKind, Instance, Marker, MarkerKind, TypeKey,
    downcast_instance, instance,
};
pub use contract::{
    Bundle, Configuration, ConfiguredBundle, HealthCheck, HealthStatus, InjectableProvider,
    Managed, Task,
};
pub use error::{BoxError, ProvisionError, ProvisionResult};
pub use host::{
    Bootstrap, Environment, Extension, FilterEnvironment, HealthCheckRegistry,
    LifecycleEnvironment, RequestContainer, RequestEnvironment, RequestFilter, ResourceConfig,
    TaskRegistry,
};
pub use inject::{Binder, Injectable, Injector, Module, Stage};
pub use universe::{COMPONENTS, ScannedUniverse, StaticUniverse, TypeUniverse};

#[doc(hidden)]
pub mod __private {
    pub use linkme;
    pub use linkme::distributed_slice;
}

/// Prelude for common imports.
pub mod prelude {
    pub use std::sync::Arc;

    pub use super::contract::*;
    pub use super::error::{BoxError, ProvisionError, ProvisionResult};
    pub use super::inject::{Binder, Injectable, Injector, Module, Stage};
}
