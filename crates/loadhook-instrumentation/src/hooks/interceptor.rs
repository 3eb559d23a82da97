//! Load interceptor: the one subscriber installed on the host loader.
//!
//! Every instrumentation registers its hooks here instead of hooking the
//! loader itself. On each load event:
//! - The module name's platform separators are normalized to `/`.
//! - Matching hooks are looked up in the trie, in registration order.
//!   Loader builtins (no base directory) only match exact registrations.
//! - Each hook's callback is folded over the exports.

use std::borrow::Cow;
use std::path::{MAIN_SEPARATOR, Path};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock, const_mutex};
use tracing::{debug, info, trace};

use loadhook_core::config::interceptor::InterceptorConfig;
use loadhook_core::result::AppResult;

use super::definitions::{Hooked, ModuleExports, OnLoadFn};
use super::trie::{MODULE_NAME_SEPARATOR, ModuleNameTrie, SearchOptions};
use crate::loader::{HostLoader, ModuleLoader};

static GLOBAL_INTERCEPTOR: Mutex<Option<Arc<LoadInterceptor>>> = const_mutex(None);

/// Dispatches load events from the host loader to registered hooks.
#[derive(Debug)]
pub struct LoadInterceptor {
    /// Registered hooks.
    trie: RwLock<ModuleNameTrie>,
    /// Loader this interceptor is subscribed to.
    loader: Arc<dyn ModuleLoader>,
    /// Interceptor settings.
    config: InterceptorConfig,
}

impl LoadInterceptor {
    /// Creates an interceptor and subscribes it to `loader`.
    ///
    /// Fails if the loader already has a global subscriber. Tests use this
    /// to get an instance whose registrations are isolated from the rest of
    /// the process.
    pub fn new(loader: Arc<dyn ModuleLoader>) -> AppResult<Arc<Self>> {
        Self::with_config(loader, InterceptorConfig::default())
    }

    /// Creates an interceptor with explicit settings.
    pub fn with_config(
        loader: Arc<dyn ModuleLoader>,
        config: InterceptorConfig,
    ) -> AppResult<Arc<Self>> {
        let interceptor = Arc::new(Self {
            trie: RwLock::new(ModuleNameTrie::new()),
            loader: loader.clone(),
            config,
        });

        let weak = Arc::downgrade(&interceptor);
        loader.subscribe(Arc::new(move |exports: ModuleExports, name: &str, base_dir: Option<&Path>| {
            match weak.upgrade() {
                Some(interceptor) => interceptor.on_load(exports, name, base_dir),
                None => exports,
            }
        }))?;

        info!(
            manifest_file = %interceptor.config.manifest_file,
            "Load interceptor subscribed to host loader"
        );

        Ok(interceptor)
    }

    /// Returns the process-wide interceptor, creating it on the
    /// process-wide [`HostLoader`] on first use.
    pub fn global() -> AppResult<Arc<Self>> {
        Self::global_with_config(InterceptorConfig::default())
    }

    /// Like [`global`](Self::global); `config` only applies if this call
    /// creates the instance.
    pub fn global_with_config(config: InterceptorConfig) -> AppResult<Arc<Self>> {
        let mut slot = GLOBAL_INTERCEPTOR.lock();
        if let Some(existing) = slot.as_ref() {
            return Ok(existing.clone());
        }

        let interceptor = Self::with_config(HostLoader::global(), config)?;
        *slot = Some(interceptor.clone());
        Ok(interceptor)
    }

    /// Registers a hook for `module_name` and returns the registration.
    pub fn register(&self, module_name: &str, on_load: OnLoadFn) -> Hooked {
        let hooked = Hooked::new(module_name, on_load);
        self.trie.write().insert(hooked.clone());

        debug!(module = %module_name, "Load hook registered");
        hooked
    }

    /// Handles one load event and returns the possibly replaced exports.
    pub fn on_load(
        &self,
        exports: ModuleExports,
        name: &str,
        base_dir: Option<&Path>,
    ) -> ModuleExports {
        let normalized = normalize_path_separators(name);
        let options = SearchOptions {
            maintain_insertion_order: true,
            full_only: base_dir.is_none(),
        };
        // Snapshot so hooks can register or trigger loads while running.
        let matches = self.trie.read().search(&normalized, options);

        if matches.is_empty() {
            return exports;
        }

        trace!(module = %name, hooks = matches.len(), "Applying load hooks");

        matches
            .into_iter()
            .fold(exports, |exports, hook| (hook.on_load)(exports, name, base_dir))
    }

    /// The loader this interceptor is subscribed to.
    pub fn loader(&self) -> &Arc<dyn ModuleLoader> {
        &self.loader
    }

    /// Interceptor settings.
    pub fn config(&self) -> &InterceptorConfig {
        &self.config
    }

    /// Number of hooks registered so far.
    pub fn hook_count(&self) -> usize {
        self.trie.read().len()
    }
}

/// Converts platform path separators in a module name to `/`.
pub fn normalize_path_separators(name: &str) -> Cow<'_, str> {
    if MAIN_SEPARATOR != MODULE_NAME_SEPARATOR && name.contains(MAIN_SEPARATOR) {
        Cow::Owned(name.replace(MAIN_SEPARATOR, "/"))
    } else {
        Cow::Borrowed(name)
    }
}
