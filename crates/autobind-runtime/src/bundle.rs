//! The lifecycle coordinator.
//!
//! [`InjectBundle`] is registered with the host as a configured bundle and
//! drives autobind through the host's two startup hooks:
//!
//! ```text
//!  Unbuilt ──initialize──▶ Bootstrapped ──run──▶ Running
//!     │                        │
//!     │ build injector         │ install request integration
//!     │ bootstrap discovery    │ populate host bindings
//!                              │ run discovery
//! ```

use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

use autobind_core::{
    Bootstrap, BoxError, Configuration, ConfiguredBundle, Environment, Injector, Module,
    RequestContainer, Stage, TypeUniverse,
};
use autobind_framework::{AutoConfig, DiscoveryError, DiscoveryReport};
use parking_lot::Mutex;
use tracing::{error, info};

use crate::bindings::{HostBindings, HostBindingsModule};
use crate::config::{AutobindConfig, validate_config};
use crate::container::{FILTER_NAME, InjectingContainer, InjectorFilter, RequestContainerModule};
use crate::error::{BundleError, BundleResult};

/// Called with status 1 when the injector cannot be built.
pub type ExitHandler = fn(i32) -> !;

fn process_exit(code: i32) -> ! {
    std::process::exit(code)
}

/// Where the bundle is in the host lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundlePhase {
    /// Neither hook has run.
    Unbuilt,
    /// The injector exists; the environment is not bound yet.
    Bootstrapped,
    /// Everything is bound and registered.
    Running,
}

struct Wiring<C> {
    injector: Arc<Injector>,
    bindings: Arc<HostBindings<C>>,
    container: Arc<InjectingContainer>,
}

impl<C> Clone for Wiring<C> {
    fn clone(&self) -> Self {
        Self {
            injector: Arc::clone(&self.injector),
            bindings: Arc::clone(&self.bindings),
            container: Arc::clone(&self.container),
        }
    }
}

enum BundleState<C> {
    Unbuilt(Vec<Box<dyn Module>>),
    /// The bootstrap hook is building the injector.
    Building,
    Bootstrapped(Wiring<C>),
    Running(Wiring<C>),
}

/// Builds the injector and runs discovery across the host lifecycle.
///
/// `C` is the host's concrete configuration type.
///
/// # Example
///
/// ```rust,ignore
/// let bundle = InjectBundle::<AppConfig>::builder()
///     .add_module(StorageModule)
///     .enable_auto_config(&["my_app::health", "my_app::jobs"])?
///     .bind_config_type()
///     .build()?;
///
/// host.add_bundle(Arc::new(bundle));
/// ```
pub struct InjectBundle<C> {
    auto_config: Option<AutoConfig>,
    stage: Stage,
    bind_config_type: bool,
    exit: ExitHandler,
    state: Mutex<BundleState<C>>,
}

impl<C: Configuration> InjectBundle<C> {
    /// Starts a builder.
    pub fn builder() -> InjectBundleBuilder<C> {
        InjectBundleBuilder::new()
    }

    /// The injector, once the bootstrap hook has run.
    pub fn injector(&self) -> Option<Arc<Injector>> {
        match &*self.state.lock() {
            BundleState::Unbuilt(_) | BundleState::Building => None,
            BundleState::Bootstrapped(wiring) | BundleState::Running(wiring) => {
                Some(Arc::clone(&wiring.injector))
            }
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> BundlePhase {
        match &*self.state.lock() {
            BundleState::Unbuilt(_) | BundleState::Building => BundlePhase::Unbuilt,
            BundleState::Bootstrapped(_) => BundlePhase::Bootstrapped,
            BundleState::Running(_) => BundlePhase::Running,
        }
    }

    /// The stage the injector is built with.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Bootstrap hook: builds the injector, then registers bootstrap
    /// categories with `bootstrap`.
    ///
    /// If the injector cannot be built, the cause is logged and the exit
    /// handler is called with status 1.
    pub fn on_bootstrap(&self, bootstrap: &mut dyn Bootstrap) -> BundleResult<DiscoveryReport> {
        let mut modules = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, BundleState::Building) {
                BundleState::Unbuilt(modules) => modules,
                previous => {
                    *state = previous;
                    return Err(BundleError::AlreadyInitialized);
                }
            }
        };

        // Modules and eager singletons run without the state lock held.
        let bindings = Arc::new(HostBindings::<C>::new());
        let container = Arc::new(InjectingContainer::new());
        modules.push(Box::new(RequestContainerModule::new(Arc::clone(&container))));
        modules.push(Box::new(HostBindingsModule::new(
            Arc::clone(&bindings),
            self.bind_config_type,
        )));

        let injector = match Injector::create(self.stage, &modules) {
            Ok(injector) => Arc::new(injector),
            Err(err) => {
                error!(error = %err, "Failed to create the injector");
                (self.exit)(1)
            }
        };
        container.attach(&injector)?;

        *self.state.lock() = BundleState::Bootstrapped(Wiring {
            injector: Arc::clone(&injector),
            bindings,
            container,
        });

        info!(
            stage = %self.stage,
            bindings = injector.binding_count(),
            "Bundle bootstrapped"
        );

        match &self.auto_config {
            Some(auto_config) => Ok(auto_config.initialize(bootstrap, &injector)?),
            None => Ok(DiscoveryReport::default()),
        }
    }

    /// Run hook: installs the request integration, binds `configuration`
    /// and `environment`, then registers run categories.
    pub fn on_run(
        &self,
        configuration: Arc<C>,
        environment: Arc<dyn Environment>,
    ) -> BundleResult<DiscoveryReport> {
        let injector = {
            let mut state = self.state.lock();
            let wiring = match &*state {
                BundleState::Unbuilt(_) | BundleState::Building => {
                    return Err(BundleError::NotInitialized);
                }
                BundleState::Running(_) => return Err(BundleError::AlreadyRunning),
                BundleState::Bootstrapped(wiring) => wiring.clone(),
            };

            let requests = environment.requests();
            wiring
                .container
                .set_resource_config(requests.resource_config())?;
            requests.replace_container(Arc::clone(&wiring.container) as Arc<dyn RequestContainer>);

            let pattern = format!("{}*", environment.context_path());
            environment.filters().add_filter(
                FILTER_NAME,
                Arc::new(InjectorFilter::new(self.stage)),
                &pattern,
            );
            info!(filter = FILTER_NAME, pattern = %pattern, "Installed request filter");

            wiring
                .bindings
                .set_environment_data(configuration, Arc::clone(&environment))?;

            let injector = Arc::clone(&wiring.injector);
            *state = BundleState::Running(wiring);
            injector
        };

        let report = match &self.auto_config {
            Some(auto_config) => auto_config.run(environment.as_ref(), &injector)?,
            None => DiscoveryReport::default(),
        };
        info!(report = %report, "Bundle running");
        Ok(report)
    }
}

impl<C: Configuration> ConfiguredBundle for InjectBundle<C> {
    fn initialize(&self, bootstrap: &mut dyn Bootstrap) -> Result<(), BoxError> {
        self.on_bootstrap(bootstrap)?;
        Ok(())
    }

    fn run(
        &self,
        configuration: Arc<dyn Configuration>,
        environment: Arc<dyn Environment>,
    ) -> Result<(), BoxError> {
        let configuration = configuration.as_any().downcast::<C>().map_err(|_| {
            BundleError::ConfigurationType {
                expected: type_name::<C>(),
            }
        })?;
        self.on_run(configuration, environment)?;
        Ok(())
    }
}

impl<C> std::fmt::Debug for InjectBundle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectBundle")
            .field("auto_config", &self.auto_config.is_some())
            .field("stage", &self.stage)
            .field("bind_config_type", &self.bind_config_type)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`InjectBundle`].
pub struct InjectBundleBuilder<C> {
    modules: Vec<Box<dyn Module>>,
    auto_config: Option<AutoConfig>,
    bind_config_type: bool,
    stage: Stage,
    exit: ExitHandler,
    _config: PhantomData<fn() -> C>,
}

impl<C: Configuration> Default for InjectBundleBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for InjectBundleBuilder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectBundleBuilder")
            .field("modules", &self.modules.len())
            .field("auto_config", &self.auto_config.is_some())
            .field("bind_config_type", &self.bind_config_type)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

impl<C: Configuration> InjectBundleBuilder<C> {
    /// Production stage, no modules, no auto config.
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            auto_config: None,
            bind_config_type: false,
            stage: Stage::Production,
            exit: process_exit,
            _config: PhantomData,
        }
    }

    /// Applies the injector and auto-config sections of `config`.
    ///
    /// Logging is left alone; install it first with
    /// [`logging::init_from_config`](crate::logging::init_from_config).
    pub fn from_config(config: &AutobindConfig) -> BundleResult<Self> {
        validate_config(config)?;

        let mut builder = Self::new().stage(config.injector.stage);
        if config.injector.bind_config_type {
            builder = builder.bind_config_type();
        }
        if !config.auto_config.namespaces.is_empty() {
            builder = builder.enable_auto_config(&config.auto_config.namespaces)?;
        }

        info!(
            stage = %config.injector.stage,
            namespaces = config.auto_config.namespaces.len(),
            "Bundle configured"
        );
        Ok(builder)
    }

    /// Adds a module to the injector.
    pub fn add_module(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    /// Adds an already boxed module.
    pub fn add_boxed_module(mut self, module: Box<dyn Module>) -> Self {
        self.modules.push(module);
        self
    }

    /// Also binds the concrete configuration type `C`.
    pub fn bind_config_type(mut self) -> Self {
        self.bind_config_type = true;
        self
    }

    /// Enables discovery over the link-time component table, restricted to
    /// `namespaces`.
    pub fn enable_auto_config<S: AsRef<str>>(mut self, namespaces: &[S]) -> BundleResult<Self> {
        if self.auto_config.is_some() {
            return Err(BundleError::AutoConfigAlreadyEnabled);
        }
        let auto_config = AutoConfig::scan(namespaces).map_err(|err| match err {
            DiscoveryError::NoNamespaces => BundleError::NoNamespaces,
            DiscoveryError::EmptyNamespace { index } => BundleError::EmptyNamespace { index },
            other => BundleError::Discovery(other),
        })?;
        self.auto_config = Some(auto_config);
        Ok(self)
    }

    /// Enables discovery over an explicit universe.
    pub fn enable_auto_config_with(
        mut self,
        universe: impl TypeUniverse + 'static,
    ) -> BundleResult<Self> {
        if self.auto_config.is_some() {
            return Err(BundleError::AutoConfigAlreadyEnabled);
        }
        self.auto_config = Some(AutoConfig::new(universe));
        Ok(self)
    }

    /// Sets the injector stage.
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    /// Replaces the handler called when the injector cannot be built.
    pub fn exit_handler(mut self, exit: ExitHandler) -> Self {
        self.exit = exit;
        self
    }

    /// Builds the bundle with the configured stage (production by default).
    pub fn build(self) -> BundleResult<InjectBundle<C>> {
        let stage = self.stage;
        self.build_with_stage(stage)
    }

    /// Builds the bundle with an explicit stage.
    pub fn build_with_stage(self, stage: Stage) -> BundleResult<InjectBundle<C>> {
        if self.modules.is_empty() {
            return Err(BundleError::NoModules);
        }
        Ok(InjectBundle {
            auto_config: self.auto_config,
            stage,
            bind_config_type: self.bind_config_type,
            exit: self.exit,
            state: Mutex::new(BundleState::Unbuilt(self.modules)),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{OnceLock, Weak};

    use autobind_core::{
        Binder, ComponentDescriptor, Extension, FilterEnvironment, HealthCheck,
        HealthCheckRegistry, Injectable, Instance, LifecycleEnvironment, Managed, ProvisionError,
        ProvisionResult, RequestContainer, RequestEnvironment, RequestFilter, ResourceConfig,
        StaticUniverse, Task, TaskRegistry, TypeKey,
    };
    use autobind_framework::DeferredError;

    use super::*;

    // ---------------------------------------------------------------------
    // Recording host
    // ---------------------------------------------------------------------

    #[derive(Default)]
    struct RecordingEnvironment {
        events: Mutex<Vec<String>>,
        context_path: String,
    }

    impl RecordingEnvironment {
        fn at(context_path: &str) -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
                context_path: context_path.to_string(),
            })
        }

        fn record(&self, event: impl Into<String>) {
            self.events.lock().push(event.into());
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }

        fn count(&self, prefix: &str) -> usize {
            self.events().iter().filter(|e| e.starts_with(prefix)).count()
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
            self.record("manage");
        }
    }

    impl RequestEnvironment for RecordingEnvironment {
        fn register_instance(&self, key: TypeKey, _instance: Instance) {
            self.record(format!("instance:{}", key.name()));
        }

        fn register_type(&self, key: TypeKey) {
            self.record(format!("type:{}", key.name()));
        }

        fn resource_config(&self) -> ResourceConfig {
            Arc::new("resource config")
        }

        fn replace_container(&self, _container: Arc<dyn RequestContainer>) {
            self.record("container");
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
            &self.context_path
        }
    }

    #[derive(Default)]
    struct RecordingBootstrap {
        extensions: usize,
    }

    impl Bootstrap for RecordingBootstrap {
        fn add_extension(&mut self, _extension: Extension) {
            self.extensions += 1;
        }
    }

    struct AppConfig {
        name: &'static str,
    }

    impl Configuration for AppConfig {
        fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    struct OtherConfig;

    impl Configuration for OtherConfig {
        fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    // ---------------------------------------------------------------------
    // Modules and components
    // ---------------------------------------------------------------------

    struct Greeting(&'static str);

    struct GreetingModule;

    impl Module for GreetingModule {
        fn configure(&self, binder: &mut Binder) -> ProvisionResult<()> {
            binder.bind_instance(Arc::new(Greeting("hello")))
        }
    }

    struct EmptyModule;

    impl Module for EmptyModule {
        fn configure(&self, _: &mut Binder) -> ProvisionResult<()> {
            Ok(())
        }
    }

    struct FailingModule;

    impl Module for FailingModule {
        fn configure(&self, _: &mut Binder) -> ProvisionResult<()> {
            Err(ProvisionError::provider("FailingModule", "database url missing"))
        }
    }

    struct Pool {
        greeting: Arc<Greeting>,
    }

    impl Managed for Pool {
        fn start(&self) -> Result<(), BoxError> {
            Ok(())
        }

        fn stop(&self) -> Result<(), BoxError> {
            Ok(())
        }
    }

    impl Injectable for Pool {
        fn inject(injector: &Injector) -> ProvisionResult<Self> {
            Ok(Pool {
                greeting: injector.get::<Greeting>()?,
            })
        }
    }

    static POOL: ComponentDescriptor = autobind_core::describe_component!(Pool, contracts: [Managed]);

    static EARLY_READS: AtomicUsize = AtomicUsize::new(0);

    /// Reads the environment while being constructed.
    struct EnvironmentProbe;

    impl Managed for EnvironmentProbe {
        fn start(&self) -> Result<(), BoxError> {
            Ok(())
        }

        fn stop(&self) -> Result<(), BoxError> {
            Ok(())
        }
    }

    impl Injectable for EnvironmentProbe {
        fn inject(injector: &Injector) -> ProvisionResult<Self> {
            injector.get::<dyn Environment>()?;
            EARLY_READS.fetch_add(1, Ordering::SeqCst);
            Ok(EnvironmentProbe)
        }
    }

    static PROBE: ComponentDescriptor =
        autobind_core::describe_component!(EnvironmentProbe, contracts: [Managed]);

    /// Reads the bundle's phase from inside `configure`.
    struct PhaseReadingModule {
        bundle: Arc<OnceLock<Weak<InjectBundle<AppConfig>>>>,
        seen: Arc<Mutex<Option<(BundlePhase, bool)>>>,
    }

    impl Module for PhaseReadingModule {
        fn configure(&self, _: &mut Binder) -> ProvisionResult<()> {
            if let Some(bundle) = self.bundle.get().and_then(Weak::upgrade) {
                *self.seen.lock() = Some((bundle.phase(), bundle.injector().is_none()));
            }
            Ok(())
        }
    }

    /// Log sink for a scoped subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn panic_exit(code: i32) -> ! {
        panic!("exit({code})")
    }

    fn bundle_with(manifest: &[&'static ComponentDescriptor]) -> InjectBundleBuilder<AppConfig> {
        InjectBundle::<AppConfig>::builder()
            .add_module(GreetingModule)
            .enable_auto_config_with(StaticUniverse::new(manifest.iter().copied()))
            .unwrap()
    }

    fn app_config() -> Arc<AppConfig> {
        Arc::new(AppConfig { name: "app" })
    }

    // ---------------------------------------------------------------------
    // Builder
    // ---------------------------------------------------------------------

    #[test]
    fn test_build_requires_modules() {
        let err = InjectBundle::<AppConfig>::builder().build().unwrap_err();
        assert!(matches!(err, BundleError::NoModules));
        assert!(InjectBundle::<AppConfig>::builder()
            .add_module(EmptyModule)
            .build()
            .is_ok());
    }

    #[test]
    fn test_enable_auto_config_validates_namespaces() {
        let none: [&str; 0] = [];
        let err = InjectBundle::<AppConfig>::builder()
            .enable_auto_config(&none)
            .unwrap_err();
        assert!(matches!(err, BundleError::NoNamespaces));

        let err = InjectBundle::<AppConfig>::builder()
            .enable_auto_config(&["my_app", ""])
            .unwrap_err();
        assert!(matches!(err, BundleError::EmptyNamespace { index: 1 }));

        let err = InjectBundle::<AppConfig>::builder()
            .enable_auto_config(&["bad::", " my_app"])
            .unwrap_err();
        assert!(matches!(
            err,
            BundleError::Discovery(DiscoveryError::InvalidNamespace { index: 0, .. })
        ));

        let err = InjectBundle::<AppConfig>::builder()
            .enable_auto_config(&["my_app", " my_app"])
            .unwrap_err();
        assert!(err.to_string().contains("namespaces[1]"));

        let err = InjectBundle::<AppConfig>::builder()
            .enable_auto_config(&["my_app"])
            .unwrap()
            .enable_auto_config(&["other"])
            .unwrap_err();
        assert!(matches!(err, BundleError::AutoConfigAlreadyEnabled));
    }

    #[test]
    fn test_build_with_stage() {
        let bundle = InjectBundle::<AppConfig>::builder()
            .add_module(EmptyModule)
            .build_with_stage(Stage::Development)
            .unwrap();
        assert_eq!(bundle.stage(), Stage::Development);
        assert_eq!(bundle.phase(), BundlePhase::Unbuilt);
        assert!(bundle.injector().is_none());
    }

    #[test]
    fn test_from_config_applies_sections() {
        let mut config = AutobindConfig::default();
        config.injector.stage = Stage::Development;
        config.injector.bind_config_type = true;
        config.auto_config.namespaces = vec![module_path!().to_string()];

        let bundle = InjectBundleBuilder::<AppConfig>::from_config(&config)
            .unwrap()
            .add_module(EmptyModule)
            .build()
            .unwrap();
        assert_eq!(bundle.stage(), Stage::Development);
        assert!(bundle.bind_config_type);
        assert!(bundle.auto_config.is_some());

        config.auto_config.namespaces = vec!["bad::".to_string()];
        assert!(matches!(
            InjectBundleBuilder::<AppConfig>::from_config(&config),
            Err(BundleError::Config(_))
        ));
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    #[test]
    fn test_initialize_builds_resolvable_graph() {
        let bundle = bundle_with(&[]).build().unwrap();
        let report = bundle.on_bootstrap(&mut RecordingBootstrap::default()).unwrap();
        assert!(report.is_empty());
        assert_eq!(bundle.phase(), BundlePhase::Bootstrapped);

        let injector = bundle.injector().unwrap();
        assert!(injector.get::<dyn RequestContainer>().is_ok());
        assert!(injector.get::<InjectingContainer>().is_ok());
        assert!(injector.get::<HostBindings<AppConfig>>().is_ok());
        assert!(injector.has_binding::<dyn Environment>());
        assert!(injector.has_binding::<dyn Configuration>());
        assert_eq!(injector.get::<Greeting>().unwrap().0, "hello");
    }

    #[test]
    fn test_scenario_single_managed_component() {
        let bundle = bundle_with(&[&POOL]).build().unwrap();
        let environment = RecordingEnvironment::at("/");

        bundle.on_bootstrap(&mut RecordingBootstrap::default()).unwrap();
        let report = bundle.on_run(app_config(), environment.clone()).unwrap();

        assert_eq!(environment.count("manage"), 1);
        assert_eq!(environment.count("task:"), 0);
        assert_eq!(report.by_category("managed"), 1);
        assert_eq!(report.registrations()[0].component, POOL.name);
        assert_eq!(bundle.phase(), BundlePhase::Running);
    }

    #[test]
    fn test_scenario_two_modules_nothing_discovered() {
        let bundle = bundle_with(&[])
            .add_module(EmptyModule)
            .build()
            .unwrap();
        let environment = RecordingEnvironment::at("/");
        let mut bootstrap = RecordingBootstrap::default();

        bundle.on_bootstrap(&mut bootstrap).unwrap();
        let report = bundle.on_run(app_config(), environment.clone()).unwrap();

        assert!(report.is_empty());
        assert_eq!(bootstrap.extensions, 0);
        for sink in ["health:", "task:", "manage", "instance:", "type:"] {
            assert_eq!(environment.count(sink), 0, "{sink} was touched");
        }
    }

    #[test]
    fn test_scenario_config_type_binding() {
        let bundle = bundle_with(&[]).bind_config_type().build().unwrap();
        bundle.on_bootstrap(&mut RecordingBootstrap::default()).unwrap();
        let injector = bundle.injector().unwrap();

        let err = injector.get::<AppConfig>().err().unwrap();
        assert!(err.to_string().contains("during the bootstrap phase"));

        let config = app_config();
        bundle
            .on_run(Arc::clone(&config), RecordingEnvironment::at("/"))
            .unwrap();
        let resolved = injector.get::<AppConfig>().unwrap();
        assert!(Arc::ptr_eq(&resolved, &config));
        assert_eq!(resolved.name, "app");
    }

    #[test]
    fn test_run_installs_request_integration_before_discovery() {
        let bundle = bundle_with(&[&POOL]).build().unwrap();
        let environment = RecordingEnvironment::at("/api/");

        bundle.on_bootstrap(&mut RecordingBootstrap::default()).unwrap();
        bundle.on_run(app_config(), environment.clone()).unwrap();

        assert_eq!(
            environment.events(),
            ["container", "filter:Injector Filter:/api/*", "manage"]
        );
        let container = bundle
            .injector()
            .unwrap()
            .get::<InjectingContainer>()
            .unwrap();
        assert!(container.resource_config().is_ok());
    }

    #[test]
    fn test_run_phase_components_see_the_environment() {
        let bundle = bundle_with(&[&PROBE]).build().unwrap();
        bundle.on_bootstrap(&mut RecordingBootstrap::default()).unwrap();
        assert_eq!(EARLY_READS.load(Ordering::SeqCst), 0);

        bundle
            .on_run(app_config(), RecordingEnvironment::at("/"))
            .unwrap();
        assert_eq!(EARLY_READS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_discovered_components_receive_module_bindings() {
        let bundle = bundle_with(&[]).build().unwrap();
        bundle.on_bootstrap(&mut RecordingBootstrap::default()).unwrap();
        let instance = bundle.injector().unwrap().instance_of(&POOL).unwrap();
        let pool = autobind_core::downcast_instance::<Pool>(&instance).unwrap();
        assert_eq!(pool.greeting.0, "hello");
    }

    #[test]
    fn test_hook_misuse_is_rejected() {
        let bundle = bundle_with(&[]).build().unwrap();
        assert!(matches!(
            bundle.on_run(app_config(), RecordingEnvironment::at("/")),
            Err(BundleError::NotInitialized)
        ));

        bundle.on_bootstrap(&mut RecordingBootstrap::default()).unwrap();
        assert!(matches!(
            bundle.on_bootstrap(&mut RecordingBootstrap::default()),
            Err(BundleError::AlreadyInitialized)
        ));

        bundle
            .on_run(app_config(), RecordingEnvironment::at("/"))
            .unwrap();
        assert!(matches!(
            bundle.on_run(app_config(), RecordingEnvironment::at("/")),
            Err(BundleError::AlreadyRunning)
        ));
    }

    #[test]
    fn test_injector_failure_exits_without_discovery() {
        let bundle = bundle_with(&[&POOL])
            .add_module(FailingModule)
            .exit_handler(panic_exit)
            .build()
            .unwrap();
        let mut bootstrap = RecordingBootstrap::default();
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();

        let outcome = tracing::subscriber::with_default(subscriber, || {
            catch_unwind(AssertUnwindSafe(|| bundle.on_bootstrap(&mut bootstrap)))
        });
        let payload = outcome.err().unwrap();
        let message = payload
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert_eq!(message, "exit(1)");
        assert_eq!(bootstrap.extensions, 0);
        assert!(bundle.injector().is_none());

        let output = logs.contents();
        assert!(output.contains("ERROR"), "{output}");
        assert!(output.contains("Failed to create the injector"), "{output}");
        assert!(output.contains("database url missing"), "{output}");
    }

    #[test]
    fn test_modules_may_query_the_bundle_while_it_bootstraps() {
        let slot = Arc::new(OnceLock::new());
        let seen = Arc::new(Mutex::new(None));
        let bundle = Arc::new(
            bundle_with(&[])
                .add_module(PhaseReadingModule {
                    bundle: Arc::clone(&slot),
                    seen: Arc::clone(&seen),
                })
                .build()
                .unwrap(),
        );
        slot.set(Arc::downgrade(&bundle)).unwrap();

        bundle.on_bootstrap(&mut RecordingBootstrap::default()).unwrap();
        assert_eq!(*seen.lock(), Some((BundlePhase::Unbuilt, true)));
        assert_eq!(bundle.phase(), BundlePhase::Bootstrapped);
        assert!(matches!(
            bundle.on_bootstrap(&mut RecordingBootstrap::default()),
            Err(BundleError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_configured_bundle_hooks_downcast_configuration() {
        let bundle = bundle_with(&[&POOL]).bind_config_type().build().unwrap();
        let environment = RecordingEnvironment::at("/");
        let hooks: &dyn ConfiguredBundle = &bundle;

        hooks.initialize(&mut RecordingBootstrap::default()).unwrap();
        let err = hooks
            .run(Arc::new(OtherConfig), environment.clone())
            .unwrap_err();
        let err = err.downcast::<BundleError>().unwrap();
        assert!(matches!(*err, BundleError::ConfigurationType { .. }));
        assert_eq!(bundle.phase(), BundlePhase::Bootstrapped);

        hooks.run(app_config(), environment.clone()).unwrap();
        assert_eq!(environment.count("manage"), 1);
    }

    #[test]
    fn test_deferred_error_surfaces_through_bundle_error() {
        let err: BundleError = DeferredError::AlreadySet.into();
        assert!(matches!(err, BundleError::Deferred(DeferredError::AlreadySet)));
    }
}
