//! The type universe: which components exist and what they are.
//!
//! Components register themselves into [`COMPONENTS`] at link time via
//! [`component!`](crate::component!). A [`TypeUniverse`] answers membership
//! queries over some subset of them.

use std::any::TypeId;
use std::collections::HashSet;

use linkme::distributed_slice;
use tracing::{debug, warn};

use crate::component::{ComponentDescriptor, ContractKind, MarkerKind};

/// Link-time table of every component declared with [`component!`](crate::component!).
#[distributed_slice]
pub static COMPONENTS: [ComponentDescriptor];

/// Answers "which components implement X" and "which carry marker Y".
pub trait TypeUniverse: Send + Sync {
    /// Components implementing contract `kind`.
    fn with_contract(&self, kind: ContractKind) -> Vec<&'static ComponentDescriptor>;

    /// Components carrying a marker of `kind`.
    fn with_marker(&self, kind: MarkerKind) -> Vec<&'static ComponentDescriptor>;
}

// =============================================================================
// ScannedUniverse
// =============================================================================

/// The registered components that live under a set of namespaces.
///
/// Results are ordered by type name so discovery is deterministic
/// regardless of link order.
#[derive(Debug)]
pub struct ScannedUniverse {
    components: Vec<&'static ComponentDescriptor>,
}

impl ScannedUniverse {
    /// Scans the link-time table for components under any of `namespaces`.
    pub fn scan<S: AsRef<str>>(namespaces: &[S]) -> Self {
        Self::scan_table(&COMPONENTS, namespaces)
    }

    fn scan_table<S: AsRef<str>>(table: &'static [ComponentDescriptor], namespaces: &[S]) -> Self {
        let mut seen = HashSet::<TypeId>::new();
        let mut components: Vec<&'static ComponentDescriptor> = Vec::new();

        for descriptor in table {
            if !namespaces
                .iter()
                .any(|ns| descriptor.in_namespace(ns.as_ref()))
            {
                continue;
            }
            if !seen.insert(descriptor.key().id()) {
                warn!(
                    component = descriptor.name,
                    "Component registered more than once, using first"
                );
                continue;
            }
            components.push(descriptor);
        }

        components.sort_by(|a, b| a.name.cmp(b.name));
        debug!(
            count = components.len(),
            total = table.len(),
            "Scanned component table"
        );
        Self { components }
    }

    /// Every component in scope.
    pub fn components(&self) -> &[&'static ComponentDescriptor] {
        &self.components
    }
}

impl TypeUniverse for ScannedUniverse {
    fn with_contract(&self, kind: ContractKind) -> Vec<&'static ComponentDescriptor> {
        let found: Vec<_> = self
            .components
            .iter()
            .copied()
            .filter(|c| c.implements(kind))
            .collect();
        debug!(contract = ?kind, count = found.len(), "Queried universe by contract");
        found
    }

    fn with_marker(&self, kind: MarkerKind) -> Vec<&'static ComponentDescriptor> {
        let found: Vec<_> = self
            .components
            .iter()
            .copied()
            .filter(|c| c.is_marked(kind))
            .collect();
        debug!(marker = ?kind, count = found.len(), "Queried universe by marker");
        found
    }
}

// =============================================================================
// StaticUniverse
// =============================================================================

/// An explicit manifest of components, queried in the order given.
#[derive(Debug, Default)]
pub struct StaticUniverse {
    components: Vec<&'static ComponentDescriptor>,
}

impl StaticUniverse {
    /// Creates a universe holding exactly `manifest`.
    pub fn new(manifest: impl IntoIterator<Item = &'static ComponentDescriptor>) -> Self {
        Self {
            components: manifest.into_iter().collect(),
        }
    }
}

impl TypeUniverse for StaticUniverse {
    fn with_contract(&self, kind: ContractKind) -> Vec<&'static ComponentDescriptor> {
        self.components
            .iter()
            .copied()
            .filter(|c| c.implements(kind))
            .collect()
    }

    fn with_marker(&self, kind: MarkerKind) -> Vec<&'static ComponentDescriptor> {
        self.components
            .iter()
            .copied()
            .filter(|c| c.is_marked(kind))
            .collect()
    }
}
