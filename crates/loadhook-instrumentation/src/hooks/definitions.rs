//! Load-event value types shared by the trie, the interceptor and the loader.

use std::any::Any;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The exported value of a module as materialized by the host loader.
///
/// Opaque to the interceptor: hooks receive it, may replace it, and pass
/// it on. Clones share the same underlying value.
#[derive(Clone)]
pub struct ModuleExports(Arc<dyn Any + Send + Sync>);

impl ModuleExports {
    /// Wraps a value as module exports.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Returns the value if it is of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Whether both handles point at the same exported value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for ModuleExports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModuleExports")
            .field(&Arc::as_ptr(&self.0))
            .finish()
    }
}

/// Transform applied to a module's exports when a matching load event fires.
///
/// Arguments are the current exports, the module name as reported by the
/// loader, and the module's base directory (absent for loader builtins).
pub type OnLoadFn =
    Arc<dyn Fn(ModuleExports, &str, Option<&Path>) -> ModuleExports + Send + Sync>;

/// A hook registered with the load interceptor.
///
/// Identity is the module name plus the callback pointer.
#[derive(Clone)]
pub struct Hooked {
    /// Module name the hook was registered for.
    pub module_name: String,
    /// Callback run on matching load events.
    pub on_load: OnLoadFn,
}

impl Hooked {
    /// Creates a hook record.
    pub fn new(module_name: impl Into<String>, on_load: OnLoadFn) -> Self {
        Self {
            module_name: module_name.into(),
            on_load,
        }
    }
}

impl PartialEq for Hooked {
    fn eq(&self, other: &Self) -> bool {
        self.module_name == other.module_name
            && std::ptr::addr_eq(Arc::as_ptr(&self.on_load), Arc::as_ptr(&other.on_load))
    }
}

impl Eq for Hooked {}

impl fmt::Debug for Hooked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooked")
            .field("module_name", &self.module_name)
            .field("on_load", &"<callback>")
            .finish()
    }
}
