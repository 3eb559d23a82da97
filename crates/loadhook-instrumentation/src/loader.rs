//! Host module loader contract and an in-process reference loader.
//!
//! The loader is the one place that materializes module exports. It accepts
//! exactly one global subscriber (the [`LoadInterceptor`]) plus any number of
//! private hooks filtered to explicit module names, which is how modules
//! addressed by absolute filesystem path are intercepted.
//!
//! [`LoadInterceptor`]: crate::hooks::interceptor::LoadInterceptor

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{debug, info};

use loadhook_core::error::AppError;
use loadhook_core::result::AppResult;

use crate::hooks::definitions::{ModuleExports, OnLoadFn};

/// Handle of a private hook installed through [`ModuleLoader::hook_modules`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateHook {
    /// Loader-assigned identifier.
    pub id: u64,
    /// Module names the hook is filtered to.
    pub modules: Vec<String>,
}

/// Contract of the host environment's module loader.
pub trait ModuleLoader: Send + Sync + fmt::Debug {
    /// Installs the single global subscriber that sees every load event,
    /// including internal files of packages and loader builtins.
    ///
    /// Fails if a subscriber is already installed.
    fn subscribe(&self, on_load: OnLoadFn) -> AppResult<()>;

    /// Installs an independent hook that only fires for the given module
    /// names. Not shared with the global subscriber.
    fn hook_modules(&self, modules: Vec<String>, on_load: OnLoadFn) -> AppResult<PrivateHook>;

    /// Whether the module is already present in the loader's module cache.
    fn is_loaded(&self, module_name: &str) -> bool;
}

#[derive(Clone)]
struct PrivateHookEntry {
    handle: PrivateHook,
    on_load: OnLoadFn,
}

/// In-process module loader.
///
/// Modules are materialized on first [`load`](Self::load), run through the
/// global subscriber and then through matching private hooks, cached, and
/// returned. Cached modules are returned without firing a load event.
pub struct HostLoader {
    subscriber: RwLock<Option<OnLoadFn>>,
    private_hooks: RwLock<Vec<PrivateHookEntry>>,
    cache: RwLock<HashMap<String, ModuleExports>>,
    next_hook_id: AtomicU64,
}

static GLOBAL_LOADER: OnceLock<Arc<HostLoader>> = OnceLock::new();

impl HostLoader {
    /// Creates an empty loader with no subscriber.
    pub fn new() -> Self {
        Self {
            subscriber: RwLock::new(None),
            private_hooks: RwLock::new(Vec::new()),
            cache: RwLock::new(HashMap::new()),
            next_hook_id: AtomicU64::new(0),
        }
    }

    /// The loader shared by the whole process.
    pub fn global() -> Arc<HostLoader> {
        GLOBAL_LOADER
            .get_or_init(|| {
                info!("Process-wide host loader created");
                Arc::new(HostLoader::new())
            })
            .clone()
    }

    /// Loads a module.
    ///
    /// `base_dir` is the package root directory and must be absent for
    /// loader builtins. `materialize` produces the raw exports and is only
    /// called on a cache miss.
    pub fn load<F>(&self, name: &str, base_dir: Option<&Path>, materialize: F) -> ModuleExports
    where
        F: FnOnce() -> ModuleExports,
    {
        if let Some(cached) = self.cache.read().get(name) {
            return cached.clone();
        }

        let mut exports = materialize();

        // Callbacks run without any loader lock held so they may load
        // other modules.
        let subscriber = self.subscriber.read().clone();
        if let Some(on_load) = subscriber {
            exports = on_load(exports, name, base_dir);
        }

        let private_hooks: Vec<PrivateHookEntry> = self
            .private_hooks
            .read()
            .iter()
            .filter(|entry| entry.handle.modules.iter().any(|m| m == name))
            .cloned()
            .collect();
        for entry in private_hooks {
            exports = (entry.on_load)(exports, name, base_dir);
        }

        debug!(module = %name, builtin = base_dir.is_none(), "Module loaded");

        self.cache
            .write()
            .entry(name.to_string())
            .or_insert(exports)
            .clone()
    }

    /// Drops a module from the cache so the next load fires again.
    pub fn evict(&self, name: &str) -> Option<ModuleExports> {
        self.cache.write().remove(name)
    }

    /// Whether a global subscriber is installed.
    pub fn has_subscriber(&self) -> bool {
        self.subscriber.read().is_some()
    }

    /// Number of private hooks installed.
    pub fn private_hook_count(&self) -> usize {
        self.private_hooks.read().len()
    }
}

impl Default for HostLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HostLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostLoader")
            .field("has_subscriber", &self.has_subscriber())
            .field("private_hooks", &self.private_hook_count())
            .field("cached_modules", &self.cache.read().len())
            .finish()
    }
}

impl ModuleLoader for HostLoader {
    fn subscribe(&self, on_load: OnLoadFn) -> AppResult<()> {
        let mut subscriber = self.subscriber.write();
        if subscriber.is_some() {
            return Err(AppError::loader(
                "A global load subscriber is already installed",
            ));
        }
        *subscriber = Some(on_load);
        Ok(())
    }

    fn hook_modules(&self, modules: Vec<String>, on_load: OnLoadFn) -> AppResult<PrivateHook> {
        if modules.is_empty() {
            return Err(AppError::validation(
                "A private hook needs at least one module name",
            ));
        }

        let handle = PrivateHook {
            id: self.next_hook_id.fetch_add(1, Ordering::Relaxed),
            modules,
        };
        self.private_hooks.write().push(PrivateHookEntry {
            handle: handle.clone(),
            on_load,
        });

        debug!(hook_id = handle.id, modules = ?handle.modules, "Private load hook installed");
        Ok(handle)
    }

    fn is_loaded(&self, module_name: &str) -> bool {
        self.cache.read().contains_key(module_name)
    }
}
