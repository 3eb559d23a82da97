//! Shared test helpers for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;

use loadhook::prelude::InstrumentationConfig;
use loadhook::{HostLoader, InstrumentationBase, LoadInterceptor, ModuleDescriptor, ModuleExports};

/// Isolated loader, interceptor and package directory.
pub struct TestApp {
    /// Loader load events are fired on
    pub loader: Arc<HostLoader>,
    /// Interceptor subscribed to `loader`
    pub interceptor: Arc<LoadInterceptor>,
    /// Holds `node_modules/`
    root: TempDir,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let loader = Arc::new(HostLoader::new());
        let interceptor =
            LoadInterceptor::new(loader.clone()).expect("Failed to subscribe interceptor");
        let root = tempfile::tempdir().expect("Failed to create temp dir");

        Self {
            loader,
            interceptor,
            root,
        }
    }

    /// Create `node_modules/<name>` with a manifest carrying `version`
    pub fn create_package(&self, name: &str, version: Option<&str>) -> PathBuf {
        let dir = self.root.path().join("node_modules").join(name);
        fs::create_dir_all(&dir).expect("Failed to create package dir");

        let manifest = match version {
            Some(version) => serde_json::json!({ "name": name, "version": version }),
            None => serde_json::json!({ "name": name }),
        };
        fs::write(dir.join("package.json"), manifest.to_string())
            .expect("Failed to write manifest");
        dir
    }

    /// Fire a load event whose raw exports are `exports`
    pub fn load(&self, name: &str, base_dir: Option<&Path>, exports: &ModuleExports) -> ModuleExports {
        let raw = exports.clone();
        self.loader.load(name, base_dir, move || raw)
    }

    /// Build an enabled instrumentation on this app's interceptor
    pub fn instrument(&self, name: &str, modules: Vec<ModuleDescriptor>) -> InstrumentationBase {
        InstrumentationBase::new(
            name,
            "0.1.0",
            InstrumentationConfig::default(),
            modules,
            self.interceptor.clone(),
        )
        .expect("Failed to build instrumentation")
    }
}

/// Module name in the platform's path style.
pub fn native(name: &str) -> String {
    name.split('/')
        .collect::<PathBuf>()
        .to_string_lossy()
        .into_owned()
}

/// Exports produced by [`CallLog::patch`].
#[derive(Debug)]
pub struct Patched {
    pub label: &'static str,
    pub original: ModuleExports,
}

/// Records every patch or unpatch invocation.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<(ModuleExports, Option<String>)>>>,
}

impl CallLog {
    /// Patch that records its input and wraps it in [`Patched`]
    pub fn patch(
        &self,
        label: &'static str,
    ) -> impl Fn(ModuleExports, Option<&str>) -> ModuleExports + Send + Sync + 'static {
        let calls = self.calls.clone();
        move |exports: ModuleExports, version: Option<&str>| {
            calls.lock().push((exports.clone(), version.map(str::to_string)));
            ModuleExports::new(Patched {
                label,
                original: exports,
            })
        }
    }

    /// Unpatch that records its input
    pub fn unpatch(&self) -> impl Fn(&ModuleExports, Option<&str>) + Send + Sync + 'static {
        let calls = self.calls.clone();
        move |exports: &ModuleExports, version: Option<&str>| {
            calls.lock().push((exports.clone(), version.map(str::to_string)));
        }
    }

    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<(ModuleExports, Option<String>)> {
        self.calls.lock().clone()
    }
}

/// Label of patched exports, `None` for unpatched ones.
pub fn patched_label(exports: &ModuleExports) -> Option<&'static str> {
    exports.downcast_ref::<Patched>().map(|patched| patched.label)
}
