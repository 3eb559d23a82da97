//! Configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section; every field has a default so an absent file is valid.

pub mod instrumentation;
pub mod interceptor;
pub mod logging;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use self::instrumentation::InstrumentationConfig;
use self::interceptor::InterceptorConfig;
use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root configuration.
///
/// Top-level deserialization target for the TOML file merged with
/// `LOADHOOK__*` environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Load interceptor settings.
    pub interceptor: InterceptorConfig,
    /// Per-instrumentation settings keyed by instrumentation name.
    pub instrumentations: HashMap<String, InstrumentationConfig>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// The file is optional. Environment variables prefixed with
    /// `LOADHOOK` (separator `__`) override file values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let config = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("LOADHOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        tracing::debug!(
            path = %path.display(),
            instrumentations = loaded.instrumentations.len(),
            "Configuration loaded"
        );

        Ok(loaded)
    }

    /// Returns the settings for one instrumentation, or the defaults when
    /// none are configured.
    pub fn instrumentation(&self, name: &str) -> InstrumentationConfig {
        self.instrumentations.get(name).cloned().unwrap_or_default()
    }
}
