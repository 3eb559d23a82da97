//! Hook system: module-name trie, load interceptor, and load-event types.

pub mod definitions;
pub mod interceptor;
pub mod trie;

pub use definitions::{Hooked, ModuleExports, OnLoadFn};
pub use interceptor::LoadInterceptor;
pub use trie::{MODULE_NAME_SEPARATOR, ModuleNameTrie, SearchOptions};
