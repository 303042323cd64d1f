//! Error types for the autobind framework.

use autobind_core::ProvisionError;
use thiserror::Error;

use crate::category::Phase;

/// Errors raised by a [`DeferredValue`](crate::DeferredValue).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeferredError {
    /// The value was read before the phase that produces it.
    #[error("{message}")]
    NotYetAvailable {
        /// Explanation shown to whoever read too early.
        message: &'static str,
    },

    /// The value was set a second time.
    #[error("deferred value already set")]
    AlreadySet,
}

/// Errors raised while discovering and registering components.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Auto config was asked to scan no namespace at all.
    #[error("at least one namespace must be given to enable auto config")]
    NoNamespaces,

    /// A namespace was blank.
    #[error("namespaces[{index}] is empty")]
    EmptyNamespace {
        /// Position in the namespace list.
        index: usize,
    },

    /// A namespace cannot match any module path.
    #[error("namespaces[{index}] is not a module path: {namespace}")]
    InvalidNamespace {
        /// Position in the namespace list.
        index: usize,
        /// The rejected entry.
        namespace: String,
    },

    /// A matched component could not be instantiated.
    #[error("failed to instantiate '{component}' for category '{category}': {source}")]
    Provision {
        /// Category being processed.
        category: &'static str,
        /// Component that failed.
        component: &'static str,
        /// Underlying injector failure.
        #[source]
        source: ProvisionError,
    },

    /// The instance did not support the contract its descriptor declared.
    #[error("'{component}' does not implement the contract of category '{category}'")]
    Cast {
        /// Category being processed.
        category: &'static str,
        /// Offending component.
        component: &'static str,
    },

    /// A category's sink belongs to another phase than the one being run.
    #[error("category '{category}' belongs to the {expected} phase, not the {actual} phase")]
    PhaseMismatch {
        /// Category being processed.
        category: &'static str,
        /// Phase of the category's sink.
        expected: Phase,
        /// Phase of the run target.
        actual: Phase,
    },
}

/// Result type for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
