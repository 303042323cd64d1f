//! Lifecycle error types.

use autobind_framework::{DeferredError, DiscoveryError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while building or driving an [`InjectBundle`](crate::InjectBundle).
#[derive(Error, Debug)]
pub enum BundleError {
    /// `build` was called without any module.
    #[error("at least one module must be added")]
    NoModules,

    /// `enable_auto_config` was given no namespace.
    #[error("at least one namespace must be given to enable auto config")]
    NoNamespaces,

    /// A namespace was blank.
    #[error("namespace at index {index} is empty")]
    EmptyNamespace { index: usize },

    /// `enable_auto_config` was called twice.
    #[error("auto config is already enabled")]
    AutoConfigAlreadyEnabled,

    /// The bootstrap hook ran a second time.
    #[error("bundle is already initialized")]
    AlreadyInitialized,

    /// The run hook ran before the bootstrap hook.
    #[error("bundle must be initialized before it runs")]
    NotInitialized,

    /// The run hook ran a second time.
    #[error("bundle is already running")]
    AlreadyRunning,

    /// The host passed a configuration of another type.
    #[error("configuration is not of type '{expected}'")]
    ConfigurationType { expected: &'static str },

    /// A deferred host value could not be set.
    #[error(transparent)]
    Deferred(#[from] DeferredError),

    /// Discovery failed.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for bundle operations.
pub type BundleResult<T> = Result<T, BundleError>;
