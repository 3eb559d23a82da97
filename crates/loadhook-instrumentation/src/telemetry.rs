//! Telemetry provider seams.
//!
//! Instrumentations acquire their tracer and meter from providers, scoped by
//! the instrumentation's name and version. The handles are opaque here; the
//! no-op providers are what an instrumentation uses until a real provider is
//! set.

use std::fmt;
use std::sync::Arc;

/// Name and version a tracer or meter was acquired for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentationScope {
    pub name: String,
    pub version: String,
}

impl InstrumentationScope {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Tracer handle.
pub trait Tracer: Send + Sync + fmt::Debug {
    fn scope(&self) -> &InstrumentationScope;
}

/// Meter handle.
pub trait Meter: Send + Sync + fmt::Debug {
    fn scope(&self) -> &InstrumentationScope;
}

/// Source of tracers.
pub trait TracerProvider: Send + Sync + fmt::Debug {
    fn get_tracer(&self, name: &str, version: &str) -> Arc<dyn Tracer>;
}

/// Source of meters.
pub trait MeterProvider: Send + Sync + fmt::Debug {
    fn get_meter(&self, name: &str, version: &str) -> Arc<dyn Meter>;
}

#[derive(Debug)]
pub struct NoopTracer {
    scope: InstrumentationScope,
}

impl Tracer for NoopTracer {
    fn scope(&self) -> &InstrumentationScope {
        &self.scope
    }
}

#[derive(Debug)]
pub struct NoopMeter {
    scope: InstrumentationScope,
}

impl Meter for NoopMeter {
    fn scope(&self) -> &InstrumentationScope {
        &self.scope
    }
}

/// Provider handing out tracers that record nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracerProvider;

impl TracerProvider for NoopTracerProvider {
    fn get_tracer(&self, name: &str, version: &str) -> Arc<dyn Tracer> {
        Arc::new(NoopTracer {
            scope: InstrumentationScope::new(name, version),
        })
    }
}

/// Provider handing out meters that record nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMeterProvider;

impl MeterProvider for NoopMeterProvider {
    fn get_meter(&self, name: &str, version: &str) -> Arc<dyn Meter> {
        Arc::new(NoopMeter {
            scope: InstrumentationScope::new(name, version),
        })
    }
}
