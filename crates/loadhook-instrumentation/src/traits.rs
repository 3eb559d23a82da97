//! The instrumentation contract.

use std::fmt;
use std::sync::Arc;

use loadhook_core::config::instrumentation::InstrumentationConfig;
use loadhook_core::result::AppResult;

use crate::telemetry::{Meter, MeterProvider, Tracer, TracerProvider};

/// Trait every instrumentation implements.
///
/// [`InstrumentationBase`](crate::lifecycle::InstrumentationBase) provides
/// the load-time machinery; concrete instrumentations usually wrap one and
/// delegate.
pub trait Instrumentation: Send + Sync + fmt::Debug {
    /// Name the instrumentation reports telemetry under.
    fn instrumentation_name(&self) -> &str;

    /// Version the instrumentation reports telemetry under.
    fn instrumentation_version(&self) -> &str;

    /// Current configuration.
    fn config(&self) -> InstrumentationConfig;

    /// Replaces the configuration. Values are not merged.
    fn set_config(&self, config: InstrumentationConfig);

    /// Starts patching. Idempotent.
    fn enable(&self) -> AppResult<()>;

    /// Reverts patches on recorded exports. Idempotent.
    fn disable(&self);

    fn is_enabled(&self) -> bool;

    /// Re-acquires the tracer from `provider`.
    fn set_tracer_provider(&self, provider: &dyn TracerProvider);

    /// Re-acquires the meter from `provider`, then calls
    /// [`update_metric_instruments`](Self::update_metric_instruments).
    fn set_meter_provider(&self, provider: &dyn MeterProvider);

    /// Rebuilds metric instruments from the current meter.
    fn update_metric_instruments(&self) {}

    fn tracer(&self) -> Arc<dyn Tracer>;

    fn meter(&self) -> Arc<dyn Meter>;
}
