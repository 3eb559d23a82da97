//! Auto-loader: wires a set of instrumentations to telemetry providers and
//! turns them on in one call.

use std::sync::Arc;

use tracing::info;

use loadhook_core::result::AppResult;

use crate::telemetry::{MeterProvider, TracerProvider};
use crate::traits::Instrumentation;

/// Input to [`register_instrumentations`].
#[derive(Debug, Default)]
pub struct AutoLoaderOptions {
    /// Instrumentations to register.
    pub instrumentations: Vec<Arc<dyn Instrumentation>>,
    /// Provider handed to every instrumentation, when set.
    pub tracer_provider: Option<Arc<dyn TracerProvider>>,
    /// Provider handed to every instrumentation, when set.
    pub meter_provider: Option<Arc<dyn MeterProvider>>,
}

impl AutoLoaderOptions {
    /// Options with the given instrumentations and no providers.
    pub fn new(instrumentations: Vec<Arc<dyn Instrumentation>>) -> Self {
        Self {
            instrumentations,
            ..Self::default()
        }
    }

    pub fn with_tracer_provider(mut self, provider: Arc<dyn TracerProvider>) -> Self {
        self.tracer_provider = Some(provider);
        self
    }

    pub fn with_meter_provider(mut self, provider: Arc<dyn MeterProvider>) -> Self {
        self.meter_provider = Some(provider);
        self
    }
}

/// Instrumentations activated by [`register_instrumentations`].
#[derive(Debug)]
#[must_use = "dropping the registration keeps instrumentations enabled; call `unload` to disable them"]
pub struct RegisteredInstrumentations {
    instrumentations: Vec<Arc<dyn Instrumentation>>,
}

impl RegisteredInstrumentations {
    /// The registered instrumentations.
    pub fn instrumentations(&self) -> &[Arc<dyn Instrumentation>] {
        &self.instrumentations
    }

    /// Disables every registered instrumentation.
    pub fn unload(self) {
        for instrumentation in &self.instrumentations {
            instrumentation.disable();
        }
        info!(
            count = self.instrumentations.len(),
            "Instrumentations unloaded"
        );
    }
}

/// Sets the providers on every instrumentation and enables those not yet
/// enabled.
///
/// Stops at the first instrumentation that fails to enable; the ones
/// before it stay enabled.
pub fn register_instrumentations(options: AutoLoaderOptions) -> AppResult<RegisteredInstrumentations> {
    let AutoLoaderOptions {
        instrumentations,
        tracer_provider,
        meter_provider,
    } = options;

    for instrumentation in &instrumentations {
        if let Some(provider) = &tracer_provider {
            instrumentation.set_tracer_provider(provider.as_ref());
        }
        if let Some(provider) = &meter_provider {
            instrumentation.set_meter_provider(provider.as_ref());
        }
        if !instrumentation.is_enabled() {
            instrumentation.enable()?;
        }
    }

    info!(
        count = instrumentations.len(),
        "Instrumentations registered"
    );

    Ok(RegisteredInstrumentations { instrumentations })
}
