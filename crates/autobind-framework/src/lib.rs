//! # Autobind Framework
//!
//! The discovery side of autobind: deciding what a component is and where
//! it goes.
//!
//! - **Deferred values**: [`DeferredValue`] bridges the gap between
//!   bootstrap and run
//! - **Categories**: the closed table of (membership, sink) pairs
//!   ([`Categories`], [`CategorySpec`])
//! - **Discovery**: [`AutoConfig`] walks the table against a
//!   [`TypeUniverse`](autobind_core::TypeUniverse)
//!
//! ## Example
//!
//! ```rust,ignore
//! use autobind_framework::AutoConfig;
//!
//! let auto_config = AutoConfig::scan(&["my_app::health", "my_app::jobs"])?;
//!
//! // While bootstrapping.
//! auto_config.initialize(&mut bootstrap, &injector)?;
//!
//! // Once the environment exists.
//! let report = auto_config.run(environment.as_ref(), &injector)?;
//! info!(%report, "Components registered");
//! ```

pub mod category;
pub mod deferred;
pub mod discovery;
pub mod error;

pub use category::{
    BootstrapSink, Candidate, Categories, CategorySpec, Membership, Phase, RunSink, Sink,
};
pub use deferred::DeferredValue;
pub use discovery::{AutoConfig, DiscoveryReport, Registration, SinkTarget, check_namespaces};
pub use error::{DeferredError, DiscoveryError, DiscoveryResult};
