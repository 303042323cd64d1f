//! Autobind Runtime - host lifecycle integration.
//!
//! This crate provides:
//! - The lifecycle coordinator (`InjectBundle`) registered with the host
//! - Deferred host bindings for the configuration and environment
//! - The request container and injector filter
//! - Configuration loading and logging setup
//!
//! # Lifecycle
//!
//! The host calls the bundle twice. The bootstrap hook builds the injector
//! and registers bundles found by discovery. The run hook binds the
//! environment, installs the request integration and registers the rest.
//!
//! ```ignore
//! use autobind_runtime::{InjectBundleBuilder, load_config, logging};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!     let bundle = InjectBundleBuilder::<AppConfig>::from_config(&config)?
//!         .add_module(StorageModule)
//!         .build()?;
//!
//!     host.add_bundle(Arc::new(bundle));
//!     host.run()
//! }
//! ```
//!
//! # Configuration
//!
//! Settings are read from `autobind.toml` (or `config.toml`) and
//! `AUTOBIND_*` environment variables:
//!
//! ```toml
//! [auto_config]
//! namespaces = ["my_app::health", "my_app::jobs"]
//!
//! [injector]
//! stage = "development"
//! bind_config_type = true
//!
//! [logging]
//! level = "debug"
//! format = "pretty"
//! ```

pub mod bindings;
pub mod bundle;
pub mod config;
pub mod container;
pub mod error;
pub mod logging;

pub use bindings::{HostBindings, HostBindingsModule};
pub use bundle::{BundlePhase, ExitHandler, InjectBundle, InjectBundleBuilder};
pub use config::{AutobindConfig, ConfigError, ConfigLoader, ConfigResult, load_config};
pub use container::{FILTER_NAME, InjectingContainer, InjectorFilter, RequestContainerModule};
pub use error::{BundleError, BundleResult};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
