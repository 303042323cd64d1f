//! # Autobind
//!
//! Component discovery and dependency injection for service hosts.
//!
//! ## Overview
//!
//! Components declare which host contracts they implement. Autobind finds
//! them under the namespaces you enable, builds them through the injector
//! and hands each one to the matching host registry.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌─────────────────────────────┐
//! │ COMPONENTS   │────▶│ AutoConfig   │────▶│ bootstrap: bundles          │
//! │ (link time)  │     │ (categories) │────▶│ run: health checks, tasks,  │
//! └──────────────┘     └──────┬───────┘     │      managed, providers,    │
//!                             │             │      resources              │
//!                      ┌──────▼───────┐     └─────────────────────────────┘
//!                      │ Injector     │
//!                      │ (modules)    │
//!                      └──────────────┘
//! ```
//!
//! - **Core**: contracts, host traits, descriptors and the injector
//! - **Framework**: deferred values, categories and discovery
//! - **Runtime**: the bundle driving both host hooks, config and logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use autobind::prelude::*;
//!
//! pub struct CacheWarmer {
//!     cache: Arc<Cache>,
//! }
//!
//! impl Managed for CacheWarmer {
//!     fn start(&self) -> Result<(), BoxError> {
//!         self.cache.warm()
//!     }
//!
//!     fn stop(&self) -> Result<(), BoxError> {
//!         Ok(())
//!     }
//! }
//!
//! impl Injectable for CacheWarmer {
//!     fn inject(injector: &Injector) -> ProvisionResult<Self> {
//!         Ok(Self { cache: injector.get::<Cache>()? })
//!     }
//! }
//!
//! component!(CacheWarmer, contracts: [Managed]);
//!
//! let bundle = InjectBundle::<AppConfig>::builder()
//!     .add_module(CacheModule)
//!     .enable_auto_config(&["my_app"])?
//!     .build()?;
//! ```
//!
//! ## Features
//!
//! - `toml-config`: read `autobind.toml` (default)
//! - `yaml-config`: read `autobind.yaml`
//! - `json-log`: JSON log output

pub use autobind_core as core;
pub use autobind_framework as framework;
pub use autobind_runtime as runtime;

pub use autobind_core::{component, describe_component};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use autobind::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Lifecycle - main entry point
    pub use autobind_runtime::{BundleError, InjectBundle, InjectBundleBuilder};

    // Components - declaring what a type is
    pub use autobind_core::{component, describe_component};
    pub use autobind_core::{
        Bundle, Configuration, ConfiguredBundle, HealthCheck, HealthStatus, InjectableProvider,
        Managed, Task,
    };

    // Injection
    pub use autobind_core::{
        Binder, BoxError, Injectable, Injector, Module, ProvisionError, ProvisionResult, Stage,
    };

    // Deferred host values
    pub use autobind_framework::{DeferredError, DeferredValue};

    // Host interfaces for custom integrations
    pub use autobind_core::{Bootstrap, Environment, Extension};
}
