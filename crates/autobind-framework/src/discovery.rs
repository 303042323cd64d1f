//! The discovery pipeline.
//!
//! For each category, in table order: ask the universe for members,
//! instantiate them through the injector and hand them to the category's
//! sink. A component matching several categories is instantiated once per
//! run and the same instance reaches every sink.

use std::any::TypeId;
use std::collections::HashMap;

use autobind_core::{Bootstrap, Environment, Injector, Instance, ScannedUniverse, TypeUniverse};
use tracing::{debug, info};

use crate::category::{BootstrapSink, Candidate, Categories, Membership, Phase, RunSink, Sink};
use crate::error::{DiscoveryError, DiscoveryResult};

/// The host surface a discovery run registers into.
pub enum SinkTarget<'a> {
    /// Bootstrap-phase target.
    Bootstrap(&'a mut dyn Bootstrap),
    /// Run-phase target.
    Run(&'a dyn Environment),
}

impl SinkTarget<'_> {
    /// Phase this target serves.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Bootstrap(_) => Phase::Bootstrap,
            Self::Run(_) => Phase::Run,
        }
    }
}

/// One successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Category the component was registered under.
    pub category: &'static str,
    /// Component type name.
    pub component: &'static str,
}

/// What a discovery run registered, in order.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    registrations: Vec<Registration>,
    instantiated: usize,
}

impl DiscoveryReport {
    /// All registrations in the order they happened.
    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Total number of registrations.
    pub fn count(&self) -> usize {
        self.registrations.len()
    }

    /// Number of registrations under `category`.
    pub fn by_category(&self, category: &str) -> usize {
        self.registrations
            .iter()
            .filter(|r| r.category == category)
            .count()
    }

    /// Number of distinct components instantiated.
    pub fn instantiated(&self) -> usize {
        self.instantiated
    }

    /// Returns `true` if nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl std::fmt::Display for DiscoveryReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Components: {} registered, {} instantiated",
            self.registrations.len(),
            self.instantiated
        )
    }
}

/// Discovers components in a [`TypeUniverse`] and registers them.
pub struct AutoConfig {
    universe: Box<dyn TypeUniverse>,
    categories: Categories,
}

impl AutoConfig {
    /// Uses `universe` with the standard category table.
    pub fn new(universe: impl TypeUniverse + 'static) -> Self {
        Self {
            universe: Box::new(universe),
            categories: Categories::standard(),
        }
    }

    /// Scans the link-time component table under `namespaces`.
    ///
    /// Fails unless `namespaces` is non-empty and every entry is a module
    /// path (see [`check_namespaces`]).
    pub fn scan<S: AsRef<str>>(namespaces: &[S]) -> DiscoveryResult<Self> {
        check_namespaces(namespaces)?;
        Ok(Self::new(ScannedUniverse::scan(namespaces)))
    }

    /// The category table in use.
    pub fn categories(&self) -> &Categories {
        &self.categories
    }

    /// Registers bootstrap-phase categories.
    pub fn initialize(
        &self,
        bootstrap: &mut dyn Bootstrap,
        injector: &Injector,
    ) -> DiscoveryResult<DiscoveryReport> {
        let categories = self.categories.for_phase(Phase::Bootstrap);
        self.discover(&categories, injector, SinkTarget::Bootstrap(bootstrap))
    }

    /// Registers run-phase categories.
    pub fn run(
        &self,
        environment: &dyn Environment,
        injector: &Injector,
    ) -> DiscoveryResult<DiscoveryReport> {
        let categories = self.categories.for_phase(Phase::Run);
        self.discover(&categories, injector, SinkTarget::Run(environment))
    }

    /// Processes `categories` in order against `target`.
    ///
    /// Every category must belong to the target's phase. The first
    /// instantiation or sink failure aborts the run.
    pub fn discover(
        &self,
        categories: &Categories,
        injector: &Injector,
        mut target: SinkTarget<'_>,
    ) -> DiscoveryResult<DiscoveryReport> {
        let mut instances: HashMap<TypeId, Instance> = HashMap::new();
        let mut report = DiscoveryReport::default();

        for spec in categories.iter() {
            let mut dispatch = match (spec.sink(), &mut target) {
                (Sink::Bootstrap(sink), SinkTarget::Bootstrap(bootstrap)) => {
                    Dispatch::Bootstrap(sink, &mut **bootstrap)
                }
                (Sink::Run(sink), SinkTarget::Run(environment)) => {
                    Dispatch::Run(sink, *environment)
                }
                (sink, target) => {
                    return Err(DiscoveryError::PhaseMismatch {
                        category: spec.name(),
                        expected: sink.phase(),
                        actual: target.phase(),
                    });
                }
            };

            let members = match spec.membership() {
                Membership::Contract(kind) => self.universe.with_contract(kind),
                Membership::Marker(kind) => self.universe.with_marker(kind),
            };
            if members.is_empty() {
                debug!(category = spec.name(), "No components matched");
                continue;
            }

            for component in members {
                let instance = if spec.instantiate() {
                    let id = component.key().id();
                    match instances.get(&id) {
                        Some(instance) => Some(instance.clone()),
                        None => {
                            let instance = injector.instance_of(component).map_err(|source| {
                                DiscoveryError::Provision {
                                    category: spec.name(),
                                    component: component.name,
                                    source,
                                }
                            })?;
                            instances.insert(id, instance.clone());
                            Some(instance)
                        }
                    }
                } else {
                    None
                };

                let candidate = Candidate {
                    category: spec.name(),
                    component,
                    instance: instance.as_ref(),
                };
                match &mut dispatch {
                    Dispatch::Bootstrap(sink, bootstrap) => sink(&mut **bootstrap, &candidate)?,
                    Dispatch::Run(sink, environment) => sink(*environment, &candidate)?,
                }

                info!(
                    category = spec.name(),
                    component = component.name,
                    "Registered component"
                );
                report.registrations.push(Registration {
                    category: spec.name(),
                    component: component.name,
                });
            }
        }

        report.instantiated = instances.len();
        debug!(phase = %target.phase(), report = %report, "Discovery finished");
        Ok(report)
    }
}

impl std::fmt::Debug for AutoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoConfig")
            .field("categories", &self.categories.len())
            .finish_non_exhaustive()
    }
}

/// A category's sink paired with the target of the same phase.
enum Dispatch<'t> {
    Bootstrap(BootstrapSink, &'t mut dyn Bootstrap),
    Run(RunSink, &'t dyn Environment),
}

/// Checks that `namespaces` is non-empty and that every entry is a
/// `::`-separated module path such as `my_app::health`.
pub fn check_namespaces<S: AsRef<str>>(namespaces: &[S]) -> DiscoveryResult<()> {
    if namespaces.is_empty() {
        return Err(DiscoveryError::NoNamespaces);
    }
    for (index, namespace) in namespaces.iter().enumerate() {
        let namespace = namespace.as_ref();
        if namespace.trim().is_empty() {
            return Err(DiscoveryError::EmptyNamespace { index });
        }
        let valid = namespace.split("::").all(|segment| {
            !segment.is_empty() && segment.chars().all(|c| c.is_alphanumeric() || c == '_')
        });
        if !valid {
            return Err(DiscoveryError::InvalidNamespace {
                index,
                namespace: namespace.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use autobind_core::{
        BoxError, Bundle, ComponentDescriptor, Configuration, ConfiguredBundle, Extension,
        FilterEnvironment, HealthCheck, HealthCheckRegistry, HealthStatus, Injectable,
        InjectableProvider, Instance, LifecycleEnvironment, Managed, ProvisionError,
        ProvisionResult, RequestContainer, RequestEnvironment, RequestFilter, ResourceConfig,
        Stage, StaticUniverse, Task, TaskRegistry, TypeKey,
    };

    use super::*;

    // ---------------------------------------------------------------------
    // Recording host
    // ---------------------------------------------------------------------

    fn short(name: &str) -> &str {
        name.rsplit("::").next().unwrap_or(name)
    }

    #[derive(Default)]
    struct RecordingEnvironment {
        events: Mutex<Vec<String>>,
    }

    impl RecordingEnvironment {
        fn record(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl HealthCheckRegistry for RecordingEnvironment {
        fn register(&self, name: &str, _check: Arc<dyn HealthCheck>) {
            self.record(format!("health:{name}"));
        }
    }

    impl TaskRegistry for RecordingEnvironment {
        fn add_task(&self, task: Arc<dyn Task>) {
            self.record(format!("task:{}", task.name()));
        }
    }

    impl LifecycleEnvironment for RecordingEnvironment {
        fn manage(&self, _managed: Arc<dyn Managed>) {
            self.record("managed".to_string());
        }
    }

    impl RequestEnvironment for RecordingEnvironment {
        fn register_instance(&self, key: TypeKey, _instance: Instance) {
            self.record(format!("instance:{}", short(key.name())));
        }

        fn register_type(&self, key: TypeKey) {
            self.record(format!("type:{}", short(key.name())));
        }

        fn resource_config(&self) -> ResourceConfig {
            Arc::new(())
        }

        fn replace_container(&self, _container: Arc<dyn RequestContainer>) {
            self.record("container".to_string());
        }
    }

    impl FilterEnvironment for RecordingEnvironment {
        fn add_filter(&self, name: &str, _filter: Arc<dyn RequestFilter>, url_pattern: &str) {
            self.record(format!("filter:{name}:{url_pattern}"));
        }
    }

    impl Environment for RecordingEnvironment {
        fn health_checks(&self) -> &dyn HealthCheckRegistry {
            self
        }

        fn admin(&self) -> &dyn TaskRegistry {
            self
        }

        fn lifecycle(&self) -> &dyn LifecycleEnvironment {
            self
        }

        fn requests(&self) -> &dyn RequestEnvironment {
            self
        }

        fn filters(&self) -> &dyn FilterEnvironment {
            self
        }

        fn context_path(&self) -> &str {
            "/"
        }
    }

    #[derive(Default)]
    struct RecordingBootstrap {
        extensions: Vec<&'static str>,
    }

    impl Bootstrap for RecordingBootstrap {
        fn add_extension(&mut self, extension: Extension) {
            self.extensions.push(match extension {
                Extension::Simple(_) => "simple",
                Extension::Configured(_) => "configured",
            });
        }
    }

    // ---------------------------------------------------------------------
    // Components
    // ---------------------------------------------------------------------

    struct Pool;

    impl Managed for Pool {
        fn start(&self) -> Result<(), BoxError> {
            Ok(())
        }

        fn stop(&self) -> Result<(), BoxError> {
            Ok(())
        }
    }

    impl Injectable for Pool {
        fn inject(_: &Injector) -> ProvisionResult<Self> {
            Ok(Pool)
        }
    }

    struct Reindex;

    impl Task for Reindex {
        fn name(&self) -> &str {
            "reindex"
        }

        fn execute(&self, _: &[(String, String)]) -> Result<(), BoxError> {
            Ok(())
        }
    }

    impl Injectable for Reindex {
        fn inject(_: &Injector) -> ProvisionResult<Self> {
            Ok(Reindex)
        }
    }

    static DB_BUILDS: AtomicUsize = AtomicUsize::new(0);

    struct Database;

    impl HealthCheck for Database {
        fn name(&self) -> &str {
            "database"
        }

        fn check(&self) -> HealthStatus {
            HealthStatus::Healthy
        }
    }

    impl Managed for Database {
        fn start(&self) -> Result<(), BoxError> {
            Ok(())
        }

        fn stop(&self) -> Result<(), BoxError> {
            Ok(())
        }
    }

    impl Injectable for Database {
        fn inject(_: &Injector) -> ProvisionResult<Self> {
            DB_BUILDS.fetch_add(1, Ordering::SeqCst);
            Ok(Database)
        }
    }

    static PARAM_BUILDS: AtomicUsize = AtomicUsize::new(0);

    struct UserParam;

    impl InjectableProvider for UserParam {}

    impl Injectable for UserParam {
        fn inject(_: &Injector) -> ProvisionResult<Self> {
            PARAM_BUILDS.fetch_add(1, Ordering::SeqCst);
            Ok(UserParam)
        }
    }

    struct Users;

    impl Injectable for Users {
        fn inject(_: &Injector) -> ProvisionResult<Self> {
            Ok(Users)
        }
    }

    struct Auth;

    impl Injectable for Auth {
        fn inject(_: &Injector) -> ProvisionResult<Self> {
            Ok(Auth)
        }
    }

    struct Metrics;

    impl Bundle for Metrics {
        fn run(&self, _: Arc<dyn Environment>) -> Result<(), BoxError> {
            Ok(())
        }
    }

    impl Injectable for Metrics {
        fn inject(_: &Injector) -> ProvisionResult<Self> {
            Ok(Metrics)
        }
    }

    struct Migrations;

    impl ConfiguredBundle for Migrations {
        fn initialize(&self, _: &mut dyn Bootstrap) -> Result<(), BoxError> {
            Ok(())
        }

        fn run(
            &self,
            _: Arc<dyn Configuration>,
            _: Arc<dyn Environment>,
        ) -> Result<(), BoxError> {
            Ok(())
        }
    }

    impl Injectable for Migrations {
        fn inject(_: &Injector) -> ProvisionResult<Self> {
            Ok(Migrations)
        }
    }

    struct Broken;

    impl Managed for Broken {
        fn start(&self) -> Result<(), BoxError> {
            Ok(())
        }

        fn stop(&self) -> Result<(), BoxError> {
            Ok(())
        }
    }

    impl Injectable for Broken {
        fn inject(_: &Injector) -> ProvisionResult<Self> {
            Err(ProvisionError::provider("Broken", "connection refused"))
        }
    }

    static POOL: ComponentDescriptor = autobind_core::describe_component!(Pool, contracts: [Managed]);
    static REINDEX: ComponentDescriptor = autobind_core::describe_component!(Reindex, contracts: [Task]);
    static DATABASE: ComponentDescriptor =
        autobind_core::describe_component!(Database, contracts: [HealthCheck, Managed]);
    static USER_PARAM: ComponentDescriptor =
        autobind_core::describe_component!(UserParam, contracts: [InjectableProvider]);
    static USERS: ComponentDescriptor =
        autobind_core::describe_component!(Users, markers: [Path("/users")]);
    static AUTH: ComponentDescriptor = autobind_core::describe_component!(Auth, markers: [Provider]);
    static METRICS: ComponentDescriptor = autobind_core::describe_component!(Metrics, contracts: [Bundle]);
    static MIGRATIONS: ComponentDescriptor =
        autobind_core::describe_component!(Migrations, contracts: [ConfiguredBundle]);
    static BROKEN: ComponentDescriptor = autobind_core::describe_component!(Broken, contracts: [Managed]);

    fn injector() -> Injector {
        Injector::create(Stage::Production, &[]).unwrap()
    }

    fn auto_config(manifest: &[&'static ComponentDescriptor]) -> AutoConfig {
        AutoConfig::new(StaticUniverse::new(manifest.iter().copied()))
    }

    // ---------------------------------------------------------------------
    // Tests
    // ---------------------------------------------------------------------

    #[test]
    fn test_managed_reaches_lifecycle_only() {
        let env = RecordingEnvironment::default();
        let report = auto_config(&[&POOL]).run(&env, &injector()).unwrap();

        assert_eq!(env.events(), ["managed"]);
        assert_eq!(report.by_category("managed"), 1);
        assert_eq!(report.by_category("task"), 0);
    }

    #[test]
    fn test_run_categories_follow_table_order() {
        let env = RecordingEnvironment::default();
        let config = auto_config(&[&POOL, &REINDEX, &USERS, &USER_PARAM, &AUTH]);
        let report = config.run(&env, &injector()).unwrap();

        assert_eq!(
            env.events(),
            [
                "instance:Auth",
                "type:UserParam",
                "instance:Users",
                "task:reindex",
                "managed",
            ]
        );
        assert_eq!(report.count(), 5);
        assert_eq!(report.instantiated(), 4);
    }

    #[test]
    fn test_multi_category_component_is_instantiated_once() {
        let env = RecordingEnvironment::default();
        let report = auto_config(&[&DATABASE]).run(&env, &injector()).unwrap();

        assert_eq!(env.events(), ["health:database", "managed"]);
        assert_eq!(DB_BUILDS.load(Ordering::SeqCst), 1);
        assert_eq!(report.count(), 2);
        assert_eq!(report.instantiated(), 1);
    }

    #[test]
    fn test_injectable_provider_is_registered_by_type() {
        let env = RecordingEnvironment::default();
        auto_config(&[&USER_PARAM]).run(&env, &injector()).unwrap();

        assert_eq!(env.events(), ["type:UserParam"]);
        assert_eq!(PARAM_BUILDS.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_bootstrap_registers_extensions() {
        let mut bootstrap = RecordingBootstrap::default();
        let config = auto_config(&[&MIGRATIONS, &METRICS, &POOL]);
        let report = config.initialize(&mut bootstrap, &injector()).unwrap();

        assert_eq!(bootstrap.extensions, ["simple", "configured"]);
        assert_eq!(report.count(), 2);
    }

    #[test]
    fn test_no_matches_is_a_no_op() {
        let env = RecordingEnvironment::default();
        let report = auto_config(&[]).run(&env, &injector()).unwrap();
        assert!(report.is_empty());
        assert!(env.events().is_empty());

        let mut bootstrap = RecordingBootstrap::default();
        let report = auto_config(&[&POOL])
            .initialize(&mut bootstrap, &injector())
            .unwrap();
        assert!(report.is_empty());
        assert!(bootstrap.extensions.is_empty());
    }

    #[test]
    fn test_provision_failure_aborts_run() {
        let env = RecordingEnvironment::default();
        let err = auto_config(&[&BROKEN, &POOL])
            .run(&env, &injector())
            .unwrap_err();

        match err {
            DiscoveryError::Provision {
                category,
                component,
                ..
            } => {
                assert_eq!(category, "managed");
                assert!(component.ends_with("::Broken"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(env.events().is_empty());
    }

    #[test]
    fn test_phase_mismatch_is_rejected() {
        let env = RecordingEnvironment::default();
        let config = auto_config(&[&METRICS]);
        let err = config
            .discover(&Categories::standard(), &injector(), SinkTarget::Run(&env))
            .unwrap_err();

        assert!(matches!(
            err,
            DiscoveryError::PhaseMismatch {
                category: "bundle",
                expected: Phase::Bootstrap,
                actual: Phase::Run,
            }
        ));
        assert!(env.events().is_empty());
    }

    #[test]
    fn test_scan_rejects_missing_or_blank_namespaces() {
        let none: [&str; 0] = [];
        assert!(matches!(
            AutoConfig::scan(&none),
            Err(DiscoveryError::NoNamespaces)
        ));
        assert!(matches!(
            AutoConfig::scan(&["", "   "]),
            Err(DiscoveryError::EmptyNamespace { index: 0 })
        ));
        assert!(matches!(
            AutoConfig::scan(&["my_app", "   "]),
            Err(DiscoveryError::EmptyNamespace { index: 1 })
        ));
    }

    #[test]
    fn test_scan_rejects_malformed_namespaces() {
        for bad in ["bad::", " my_app", "::my_app", "my-app", "my_app:::jobs"] {
            match AutoConfig::scan(&[bad]) {
                Err(DiscoveryError::InvalidNamespace { index, namespace }) => {
                    assert_eq!(index, 0);
                    assert_eq!(namespace, bad);
                }
                other => panic!("accepted {bad}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_scan_accepts_module_paths() {
        let config = AutoConfig::scan(&["my_app", "my_app::health", "crate2::v1::jobs"]).unwrap();
        assert_eq!(config.categories().len(), Categories::standard().len());
    }

    #[test]
    fn test_explicit_binding_supplies_instance() {
        struct PoolModule(Arc<Pool>);

        impl autobind_core::Module for PoolModule {
            fn configure(&self, binder: &mut autobind_core::Binder) -> ProvisionResult<()> {
                binder.bind_instance(Arc::clone(&self.0))
            }
        }

        let pool = Arc::new(Pool);
        let modules: Vec<Box<dyn autobind_core::Module>> = vec![Box::new(PoolModule(Arc::clone(&pool)))];
        let injector = Injector::create(Stage::Production, &modules).unwrap();

        let instance = injector.instance_of(&POOL).unwrap();
        let concrete = autobind_core::downcast_instance::<Pool>(&instance).unwrap();
        assert!(Arc::ptr_eq(&concrete, &pool));
        assert!(POOL.managed(&instance).is_some());
    }
}
