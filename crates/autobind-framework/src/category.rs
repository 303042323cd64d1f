//! The closed table of component categories.
//!
//! A category pairs a membership test (a contract or a marker) with the
//! host sink its members are registered into. The sink's phase decides
//! whether the category runs while bootstrapping or once the environment
//! exists.

use autobind_core::{
    Bootstrap, ComponentDescriptor, ContractKind, Environment, Extension, Instance, MarkerKind,
};

use crate::error::{DiscoveryError, DiscoveryResult};

/// Startup phase a category is processed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before the environment exists.
    Bootstrap,
    /// After the environment and configuration are available.
    Run,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bootstrap => f.write_str("bootstrap"),
            Self::Run => f.write_str("run"),
        }
    }
}

/// How a component qualifies for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// The component implements a contract.
    Contract(ContractKind),
    /// The component carries a marker.
    Marker(MarkerKind),
}

/// A component matched by a category, ready to be registered.
#[derive(Debug)]
pub struct Candidate<'a> {
    /// Name of the category that matched.
    pub category: &'static str,
    /// The matched component.
    pub component: &'static ComponentDescriptor,
    /// Its instance; `None` for categories registered by type.
    pub instance: Option<&'a Instance>,
}

impl<'a> Candidate<'a> {
    fn require_instance(&self) -> DiscoveryResult<&'a Instance> {
        self.instance.ok_or_else(|| self.cast_error())
    }

    fn cast_error(&self) -> DiscoveryError {
        DiscoveryError::Cast {
            category: self.category,
            component: self.component.name,
        }
    }
}

/// Registers a candidate during the bootstrap phase.
pub type BootstrapSink = fn(&mut dyn Bootstrap, &Candidate<'_>) -> DiscoveryResult<()>;

/// Registers a candidate during the run phase.
pub type RunSink = fn(&dyn Environment, &Candidate<'_>) -> DiscoveryResult<()>;

/// Where a category's members go. The variant fixes the category's phase.
#[derive(Clone, Copy)]
pub enum Sink {
    Bootstrap(BootstrapSink),
    Run(RunSink),
}

impl Sink {
    /// Phase this sink can be invoked in.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Bootstrap(_) => Phase::Bootstrap,
            Self::Run(_) => Phase::Run,
        }
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sink::{:?}", self.phase())
    }
}

/// One row of the category table.
#[derive(Debug, Clone, Copy)]
pub struct CategorySpec {
    name: &'static str,
    membership: Membership,
    instantiate: bool,
    sink: Sink,
}

impl CategorySpec {
    const fn new(name: &'static str, membership: Membership, instantiate: bool, sink: Sink) -> Self {
        Self {
            name,
            membership,
            instantiate,
            sink,
        }
    }

    /// Category name used in logs and errors.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Membership test.
    pub fn membership(&self) -> Membership {
        self.membership
    }

    /// Whether members are instantiated before registration.
    pub fn instantiate(&self) -> bool {
        self.instantiate
    }

    /// Registration target.
    pub fn sink(&self) -> Sink {
        self.sink
    }

    /// Phase of the sink.
    pub fn phase(&self) -> Phase {
        self.sink.phase()
    }
}

const STANDARD: [CategorySpec; 8] = [
    CategorySpec::new(
        "bundle",
        Membership::Contract(ContractKind::Bundle),
        true,
        Sink::Bootstrap(add_bundle),
    ),
    CategorySpec::new(
        "configured bundle",
        Membership::Contract(ContractKind::ConfiguredBundle),
        true,
        Sink::Bootstrap(add_configured_bundle),
    ),
    CategorySpec::new(
        "health check",
        Membership::Contract(ContractKind::HealthCheck),
        true,
        Sink::Run(register_health_check),
    ),
    CategorySpec::new(
        "provider",
        Membership::Marker(MarkerKind::Provider),
        true,
        Sink::Run(register_request_instance),
    ),
    CategorySpec::new(
        "injectable provider",
        Membership::Contract(ContractKind::InjectableProvider),
        false,
        Sink::Run(register_request_type),
    ),
    CategorySpec::new(
        "resource",
        Membership::Marker(MarkerKind::Path),
        true,
        Sink::Run(register_request_instance),
    ),
    CategorySpec::new(
        "task",
        Membership::Contract(ContractKind::Task),
        true,
        Sink::Run(add_task),
    ),
    CategorySpec::new(
        "managed",
        Membership::Contract(ContractKind::Managed),
        true,
        Sink::Run(manage),
    ),
];

/// An ordered list of categories.
#[derive(Debug, Clone)]
pub struct Categories {
    specs: Vec<CategorySpec>,
}

impl Categories {
    /// The full table: bootstrap categories first, then run categories.
    pub fn standard() -> Self {
        Self {
            specs: STANDARD.to_vec(),
        }
    }

    /// The subset processed in `phase`, order preserved.
    pub fn for_phase(&self, phase: Phase) -> Self {
        Self {
            specs: self
                .specs
                .iter()
                .filter(|spec| spec.phase() == phase)
                .copied()
                .collect(),
        }
    }

    /// Iterates in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &CategorySpec> {
        self.specs.iter()
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns `true` if no category is present.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for Categories {
    fn default() -> Self {
        Self::standard()
    }
}

// =============================================================================
// Sinks
// =============================================================================

fn add_bundle(bootstrap: &mut dyn Bootstrap, candidate: &Candidate<'_>) -> DiscoveryResult<()> {
    let instance = candidate.require_instance()?;
    let bundle = candidate
        .component
        .bundle(instance)
        .ok_or_else(|| candidate.cast_error())?;
    bootstrap.add_extension(Extension::Simple(bundle));
    Ok(())
}

fn add_configured_bundle(
    bootstrap: &mut dyn Bootstrap,
    candidate: &Candidate<'_>,
) -> DiscoveryResult<()> {
    let instance = candidate.require_instance()?;
    let bundle = candidate
        .component
        .configured_bundle(instance)
        .ok_or_else(|| candidate.cast_error())?;
    bootstrap.add_extension(Extension::Configured(bundle));
    Ok(())
}

fn register_health_check(env: &dyn Environment, candidate: &Candidate<'_>) -> DiscoveryResult<()> {
    let instance = candidate.require_instance()?;
    let check = candidate
        .component
        .health_check(instance)
        .ok_or_else(|| candidate.cast_error())?;
    let name = check.name().to_string();
    env.health_checks().register(&name, check);
    Ok(())
}

fn register_request_instance(
    env: &dyn Environment,
    candidate: &Candidate<'_>,
) -> DiscoveryResult<()> {
    let instance = candidate.require_instance()?;
    env.requests()
        .register_instance(candidate.component.key(), instance.clone());
    Ok(())
}

fn register_request_type(env: &dyn Environment, candidate: &Candidate<'_>) -> DiscoveryResult<()> {
    env.requests().register_type(candidate.component.key());
    Ok(())
}

fn add_task(env: &dyn Environment, candidate: &Candidate<'_>) -> DiscoveryResult<()> {
    let instance = candidate.require_instance()?;
    let task = candidate
        .component
        .task(instance)
        .ok_or_else(|| candidate.cast_error())?;
    env.admin().add_task(task);
    Ok(())
}

fn manage(env: &dyn Environment, candidate: &Candidate<'_>) -> DiscoveryResult<()> {
    let instance = candidate.require_instance()?;
    let managed = candidate
        .component
        .managed(instance)
        .ok_or_else(|| candidate.cast_error())?;
    env.lifecycle().manage(managed);
    Ok(())
}
