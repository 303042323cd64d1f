//! Unified error types for the autobind core.
//!
//! Discovery and lifecycle errors live in `autobind-framework` and
//! `autobind-runtime`; this module only covers the injector.

use std::fmt::Display;

use thiserror::Error;

/// Boxed error returned across host-facing hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Provision Errors
// =============================================================================

/// Errors raised while building the injector or resolving a binding.
#[derive(Debug, Clone, Error)]
pub enum ProvisionError {
    /// Nothing is bound for the requested type.
    #[error("no binding for '{type_name}'")]
    MissingBinding {
        /// The requested type.
        type_name: &'static str,
    },

    /// A second module tried to bind an already bound type.
    #[error("binding for '{type_name}' already configured by module '{previous}'")]
    DuplicateBinding {
        /// The bound type.
        type_name: &'static str,
        /// Module that registered the first binding.
        previous: String,
    },

    /// The binding produced a value of another type.
    #[error("binding for '{type_name}' produced a value of a different type")]
    TypeMismatch {
        /// The requested type.
        type_name: &'static str,
    },

    /// A provider refused to produce a value.
    #[error("error in provider for '{type_name}': {reason}")]
    Provider {
        /// The provided type.
        type_name: &'static str,
        /// Why the provider failed.
        reason: String,
    },

    /// A type depends on itself, directly or transitively.
    #[error("circular dependency while constructing '{type_name}'")]
    Cycle {
        /// The type whose construction re-entered itself.
        type_name: &'static str,
    },

    /// A module failed while declaring its bindings.
    #[error("module '{module}' failed to configure: {source}")]
    Module {
        /// Module name.
        module: String,
        /// Underlying failure.
        #[source]
        source: Box<ProvisionError>,
    },
}

impl ProvisionError {
    /// Creates a provider error for `type_name` from any displayable cause.
    pub fn provider(type_name: &'static str, reason: impl Display) -> Self {
        Self::Provider {
            type_name,
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for injector operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;
