//! # loadhook
//!
//! Load-time module instrumentation. Re-exports the configuration and error
//! types of `loadhook-core` and the interceptor, descriptors and lifecycle
//! of `loadhook-instrumentation`, and sets up logging.

pub mod logging;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

pub use loadhook_core::config::AppConfig;
pub use loadhook_core::{AppError, AppResult, ErrorKind};
pub use loadhook_instrumentation::{
    AutoLoaderOptions, FileDescriptor, HostLoader, Hooked, Instrumentation, InstrumentationBase,
    LoadInterceptor, ModuleDescriptor, ModuleExports, ModuleLoader, RegisteredInstrumentations,
    VersionedTarget, prelude, register_instrumentations,
};

/// Loads configuration from `config_path`, initializes logging and returns
/// the process-wide interceptor.
pub fn init(config_path: impl AsRef<Path>) -> AppResult<(AppConfig, Arc<LoadInterceptor>)> {
    let config = AppConfig::load(config_path)?;
    logging::init_logging(&config.logging)?;

    let interceptor = LoadInterceptor::global_with_config(config.interceptor.clone())?;
    info!(
        instrumentations = config.instrumentations.len(),
        "loadhook initialized"
    );

    Ok((config, interceptor))
}
