//! Prelude for writing instrumentations.

pub use loadhook_core::config::instrumentation::InstrumentationConfig;
pub use loadhook_core::error::AppError;
pub use loadhook_core::result::AppResult;

pub use crate::descriptor::{FileDescriptor, ModuleDescriptor, VersionedTarget};
pub use crate::hooks::definitions::ModuleExports;
pub use crate::hooks::interceptor::LoadInterceptor;
pub use crate::lifecycle::InstrumentationBase;
pub use crate::registry::{AutoLoaderOptions, register_instrumentations};
pub use crate::telemetry::{Meter, MeterProvider, Tracer, TracerProvider};
pub use crate::traits::Instrumentation;
pub use crate::utils::{safe_execute_in_the_middle, safe_execute_in_the_middle_async};
