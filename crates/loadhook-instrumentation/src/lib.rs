//! # loadhook-instrumentation
//!
//! Load-time instrumentation for a host module loader:
//!
//! - A single [`LoadInterceptor`] subscribed to the loader, dispatching load
//!   events to hooks stored in a [`ModuleNameTrie`]
//! - Version gating of module descriptors against the package manifest
//! - [`InstrumentationBase`]: hook registration, patching, enable/disable
//!   with replay over already loaded modules
//! - An auto-loader wiring instrumentations to telemetry providers

pub mod descriptor;
pub mod hooks;
pub mod lifecycle;
pub mod loader;
pub mod manifest;
pub mod prelude;
pub mod registry;
pub mod telemetry;
pub mod traits;
pub mod utils;
pub mod version;

pub use descriptor::{FileDescriptor, ModuleDescriptor, VersionedTarget};
pub use hooks::definitions::{Hooked, ModuleExports, OnLoadFn};
pub use hooks::interceptor::LoadInterceptor;
pub use hooks::trie::{ModuleNameTrie, SearchOptions};
pub use lifecycle::{InstrumentationBase, MetricInstrumentsFn};
pub use loader::{HostLoader, ModuleLoader, PrivateHook};
pub use registry::{AutoLoaderOptions, RegisteredInstrumentations, register_instrumentations};
pub use traits::Instrumentation;
