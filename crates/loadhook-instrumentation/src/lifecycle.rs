//! Instrumentation lifecycle: hook registration, version-gated patching,
//! enable/disable with replay.
//!
//! An [`InstrumentationBase`] registers one hook per module descriptor the
//! first time it is enabled. Every matching load records the exports it saw,
//! whether or not the instrumentation is enabled at that moment, so later
//! `enable()`/`disable()` calls can patch or unpatch modules that are already
//! loaded without registering anything again.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use loadhook_core::config::AppConfig;
use loadhook_core::config::instrumentation::InstrumentationConfig;
use loadhook_core::result::AppResult;

use crate::descriptor::{ModuleDescriptor, VersionedTarget, normalize_path};
use crate::hooks::definitions::{Hooked, ModuleExports, OnLoadFn};
use crate::hooks::interceptor::LoadInterceptor;
use crate::loader::{ModuleLoader, PrivateHook};
use crate::manifest;
use crate::telemetry::{
    Meter, MeterProvider, NoopMeterProvider, NoopTracerProvider, Tracer, TracerProvider,
};
use crate::traits::Instrumentation;

/// Exports and version observed for one module or file.
#[derive(Debug, Clone, Default)]
pub struct TargetState {
    pub exports: Option<ModuleExports>,
    pub version: Option<String>,
}

/// Observed state of a module descriptor and its files.
#[derive(Debug, Clone, Default)]
pub struct ModuleState {
    pub exports: Option<ModuleExports>,
    pub version: Option<String>,
    /// Indexed like [`ModuleDescriptor::files`].
    pub files: Vec<TargetState>,
}

/// Registration made for a module descriptor.
#[derive(Debug, Clone)]
pub enum HookHandle {
    /// Hook in the shared load interceptor.
    Shared(Hooked),
    /// Private loader hook, used for modules named by absolute path.
    Private(PrivateHook),
}

/// Builds metric instruments from a meter. Runs again whenever the meter
/// provider changes.
pub type MetricInstrumentsFn = Arc<dyn Fn(&dyn Meter) + Send + Sync>;

/// Recorded exports of one target, copied out of the state lock.
struct Recorded {
    module: usize,
    file: Option<usize>,
    exports: ModuleExports,
    version: Option<String>,
}

struct Inner {
    name: String,
    version: String,
    config: RwLock<InstrumentationConfig>,
    modules: Vec<ModuleDescriptor>,
    state: Mutex<Vec<ModuleState>>,
    hooks: Mutex<Vec<HookHandle>>,
    enabled: AtomicBool,
    interceptor: Arc<LoadInterceptor>,
    tracer: RwLock<Arc<dyn Tracer>>,
    meter: RwLock<Arc<dyn Meter>>,
    metric_instruments: RwLock<Option<MetricInstrumentsFn>>,
}

impl fmt::Debug for Inner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inner")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("modules", &self.modules)
            .field("hooks", &self.hooks.try_lock().map(|hooks| hooks.len()))
            .field("enabled", &self.is_enabled())
            .field("has_metric_instruments", &self.metric_instruments.read().is_some())
            .finish_non_exhaustive()
    }
}

/// Base implementation of [`Instrumentation`] for load-time patching.
///
/// Cloning yields another handle to the same instrumentation.
#[derive(Debug, Clone)]
pub struct InstrumentationBase {
    inner: Arc<Inner>,
}

impl InstrumentationBase {
    /// Creates an instrumentation over `modules`, enabling it right away
    /// when `config.enabled` is set.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        config: InstrumentationConfig,
        modules: Vec<ModuleDescriptor>,
        interceptor: Arc<LoadInterceptor>,
    ) -> AppResult<Self> {
        let name = name.into();
        let version = version.into();

        if modules.is_empty() {
            debug!(
                instrumentation = %name,
                "No modules to instrument, nothing will be patched"
            );
        }

        let state = modules
            .iter()
            .map(|module| ModuleState {
                files: vec![TargetState::default(); module.files().len()],
                ..ModuleState::default()
            })
            .collect();

        let enable_now = config.enabled;
        let instrumentation = Self {
            inner: Arc::new(Inner {
                tracer: RwLock::new(NoopTracerProvider.get_tracer(&name, &version)),
                meter: RwLock::new(NoopMeterProvider.get_meter(&name, &version)),
                metric_instruments: RwLock::new(None),
                name,
                version,
                config: RwLock::new(config),
                modules,
                state: Mutex::new(state),
                hooks: Mutex::new(Vec::new()),
                enabled: AtomicBool::new(false),
                interceptor,
            }),
        };

        if enable_now {
            instrumentation.enable()?;
        }

        Ok(instrumentation)
    }

    /// Creates an instrumentation using its entry in `app_config`, or the
    /// default configuration when it has none.
    pub fn from_app_config(
        app_config: &AppConfig,
        name: &str,
        version: impl Into<String>,
        modules: Vec<ModuleDescriptor>,
        interceptor: Arc<LoadInterceptor>,
    ) -> AppResult<Self> {
        let config = app_config.instrumentation(name);
        Self::new(name, version, config, modules, interceptor)
    }

    /// Installs the metric instrument builder and runs it against the
    /// current meter.
    pub fn with_metric_instruments<F>(self, build: F) -> Self
    where
        F: Fn(&dyn Meter) + Send + Sync + 'static,
    {
        *self.inner.metric_instruments.write() = Some(Arc::new(build));
        self.update_metric_instruments();
        self
    }

    /// Module descriptors in registration order.
    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.inner.modules
    }

    /// Registrations made so far.
    pub fn hooks(&self) -> Vec<HookHandle> {
        self.inner.hooks.lock().clone()
    }

    /// Observed state of the first module descriptor named `module_name`.
    pub fn module_state(&self, module_name: &str) -> Option<ModuleState> {
        let index = self
            .inner
            .modules
            .iter()
            .position(|module| module.name() == module_name)?;
        Some(self.inner.state.lock()[index].clone())
    }

    /// Interceptor hooks are registered with.
    pub fn interceptor(&self) -> &Arc<LoadInterceptor> {
        &self.inner.interceptor
    }

    /// Registers hooks for the descriptors not yet registered. `hooks` is
    /// indexed like the descriptors, so a failed call resumes where it
    /// stopped.
    fn register_hooks(&self, hooks: &mut Vec<HookHandle>) -> AppResult<()> {
        let inner = &self.inner;

        if hooks.is_empty() && inner.interceptor.config().warn_on_preloaded {
            inner.warn_on_preloaded_modules();
        }

        for (index, module) in inner.modules.iter().enumerate().skip(hooks.len()) {
            let on_load = self.dispatcher(index);

            let handle = if Path::new(module.name()).is_absolute() {
                let private = inner
                    .interceptor
                    .loader()
                    .hook_modules(vec![module.name().to_string()], on_load)?;
                HookHandle::Private(private)
            } else {
                HookHandle::Shared(inner.interceptor.register(module.name(), on_load))
            };
            hooks.push(handle);
        }

        debug!(
            instrumentation = %inner.name,
            hooks = hooks.len(),
            "Instrumentation hooks registered"
        );
        Ok(())
    }

    /// Hook callback for one module descriptor.
    fn dispatcher(&self, index: usize) -> OnLoadFn {
        let weak = Arc::downgrade(&self.inner);
        Arc::new(move |exports: ModuleExports, name: &str, base_dir: Option<&Path>| {
            match weak.upgrade() {
                Some(inner) => inner.on_module_load(index, exports, name, base_dir),
                None => exports,
            }
        })
    }
}

impl Inner {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn on_module_load(
        &self,
        index: usize,
        exports: ModuleExports,
        name: &str,
        base_dir: Option<&Path>,
    ) -> ModuleExports {
        let module = &self.modules[index];
        let enabled = self.is_enabled();

        // Loader builtins carry no manifest.
        let Some(base_dir) = base_dir else {
            let Some(patch) = module.patch() else {
                return exports;
            };
            self.state.lock()[index].exports = Some(exports.clone());
            return if enabled { patch(exports, None) } else { exports };
        };

        let version =
            manifest::extract_package_version(base_dir, &self.interceptor.config().manifest_file);
        self.state.lock()[index].version = version.clone();

        if name == module.name() {
            if !module.is_supported(version.as_deref()) {
                debug!(
                    instrumentation = %self.name,
                    module = %name,
                    version = ?version,
                    "Module version not supported, skipping patch"
                );
                return exports;
            }
            let Some(patch) = module.patch() else {
                return exports;
            };
            self.state.lock()[index].exports = Some(exports.clone());
            return if enabled {
                patch(exports, version.as_deref())
            } else {
                exports
            };
        }

        let observed = normalize_path(name);
        module
            .files()
            .iter()
            .enumerate()
            .filter(|(_, file)| file.name() == observed && file.is_supported(version.as_deref()))
            .fold(exports, |exports, (file_index, file)| {
                {
                    let mut state = self.state.lock();
                    let target = &mut state[index].files[file_index];
                    target.exports = Some(exports.clone());
                    target.version = version.clone();
                }
                match file.patch() {
                    Some(patch) if enabled => patch(exports, version.as_deref()),
                    _ => exports,
                }
            })
    }

    fn warn_on_preloaded_modules(&self) {
        let loader = self.interceptor.loader();
        for module in &self.modules {
            if loader.is_loaded(module.name()) {
                warn!(
                    instrumentation = %self.name,
                    module = %module.name(),
                    "Module was loaded before the instrumentation was enabled and may not be patched"
                );
            }
        }
    }

    fn recorded(&self) -> Vec<Recorded> {
        let state = self.state.lock();
        let mut recorded = Vec::new();
        for (module, module_state) in state.iter().enumerate() {
            if let Some(exports) = &module_state.exports {
                recorded.push(Recorded {
                    module,
                    file: None,
                    exports: exports.clone(),
                    version: module_state.version.clone(),
                });
            }
            for (file, file_state) in module_state.files.iter().enumerate() {
                if let Some(exports) = &file_state.exports {
                    recorded.push(Recorded {
                        module,
                        file: Some(file),
                        exports: exports.clone(),
                        version: file_state.version.clone(),
                    });
                }
            }
        }
        recorded
    }

    fn target(&self, recorded: &Recorded) -> &dyn VersionedTarget {
        let module = &self.modules[recorded.module];
        match recorded.file {
            Some(file) => &module.files()[file] as &dyn VersionedTarget,
            None => module as &dyn VersionedTarget,
        }
    }

    /// Patches recorded exports again. The returned exports are dropped:
    /// already loaded modules cannot be replaced in the loader cache.
    fn replay_patches(&self) {
        for recorded in self.recorded() {
            if let Some(patch) = self.target(&recorded).patch() {
                patch(recorded.exports, recorded.version.as_deref());
            }
        }
    }

    fn unpatch_all(&self) {
        for recorded in self.recorded() {
            if let Some(unpatch) = self.target(&recorded).unpatch() {
                unpatch(&recorded.exports, recorded.version.as_deref());
            }
        }
    }
}

impl Instrumentation for InstrumentationBase {
    fn instrumentation_name(&self) -> &str {
        &self.inner.name
    }

    fn instrumentation_version(&self) -> &str {
        &self.inner.version
    }

    fn config(&self) -> InstrumentationConfig {
        self.inner.config.read().clone()
    }

    fn set_config(&self, config: InstrumentationConfig) {
        *self.inner.config.write() = config;
    }

    fn enable(&self) -> AppResult<()> {
        if self.inner.enabled.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut hooks = self.inner.hooks.lock();
        let registered = hooks.len();
        if registered < self.inner.modules.len() {
            if let Err(e) = self.register_hooks(&mut hooks) {
                drop(hooks);
                warn!(
                    instrumentation = %self.inner.name,
                    error = %e,
                    "Failed to register instrumentation hooks, staying disabled"
                );
                self.inner.enabled.store(false, Ordering::SeqCst);
                self.inner.unpatch_all();
                return Err(e);
            }
        }
        drop(hooks);

        info!(instrumentation = %self.inner.name, "Instrumentation enabled");

        if registered > 0 {
            self.inner.replay_patches();
        }
        Ok(())
    }

    fn disable(&self) {
        if !self.inner.enabled.swap(false, Ordering::SeqCst) {
            return;
        }

        info!(instrumentation = %self.inner.name, "Instrumentation disabled");
        self.inner.unpatch_all();
    }

    fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    fn set_tracer_provider(&self, provider: &dyn TracerProvider) {
        *self.inner.tracer.write() = provider.get_tracer(&self.inner.name, &self.inner.version);
    }

    fn set_meter_provider(&self, provider: &dyn MeterProvider) {
        *self.inner.meter.write() = provider.get_meter(&self.inner.name, &self.inner.version);
        self.update_metric_instruments();
    }

    fn update_metric_instruments(&self) {
        let build = self.inner.metric_instruments.read().clone();
        if let Some(build) = build {
            let meter = self.meter();
            build(meter.as_ref());
        }
    }

    fn tracer(&self) -> Arc<dyn Tracer> {
        self.inner.tracer.read().clone()
    }

    fn meter(&self) -> Arc<dyn Meter> {
        self.inner.meter.read().clone()
    }
}
