//! A small binding graph.
//!
//! Modules declare bindings on a [`Binder`]; [`Injector::create`] freezes
//! them into an immutable graph. Anything not bound explicitly but known
//! through a [`ComponentDescriptor`](crate::component::ComponentDescriptor)
//! or an [`Injectable`] impl is constructed just in time.
//!
//! ```rust,ignore
//! struct StorageModule;
//!
//! impl Module for StorageModule {
//!     fn configure(&self, binder: &mut Binder) -> ProvisionResult<()> {
//!         binder.bind_instance(Arc::new(PoolSize(8)))?;
//!         binder.bind_singleton(|injector| {
//!             let size = injector.get::<PoolSize>()?;
//!             Ok(Arc::new(Pool::new(size.0)) as Arc<dyn Storage>)
//!         })
//!     }
//! }
//!
//! let injector = Injector::create(Stage::Production, &[Box::new(StorageModule)])?;
//! let storage = injector.get::<dyn Storage>()?;
//! ```

mod binder;
mod injector;

pub use binder::Binder;
pub use injector::Injector;

use serde::{Deserialize, Serialize};

use crate::error::ProvisionResult;

/// When singletons are constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Singletons are built while the injector is created, so failures
    /// surface at startup.
    #[default]
    Production,
    /// Singletons are built on first use.
    Development,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Production => f.write_str("production"),
            Self::Development => f.write_str("development"),
        }
    }
}

/// A unit of binding declarations.
pub trait Module: Send + Sync {
    /// Name reported in errors and logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Declares this module's bindings.
    fn configure(&self, binder: &mut Binder) -> ProvisionResult<()>;
}

/// A type the injector can construct on its own.
///
/// Implement this for every component registered with
/// [`component!`](crate::component!); pull dependencies from `injector`.
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Builds a new value.
    fn inject(injector: &Injector) -> ProvisionResult<Self>;
}
