//! Per-instrumentation configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration handed to an instrumentation at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentationConfig {
    /// Whether the instrumentation enables itself when constructed.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Instrumentation-specific options.
    #[serde(flatten)]
    pub options: HashMap<String, serde_json::Value>,
}

impl InstrumentationConfig {
    /// Returns a config with the given enabled flag and no options.
    pub fn with_enabled(enabled: bool) -> Self {
        Self {
            enabled,
            options: HashMap::new(),
        }
    }

    /// Sets an option value.
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Reads an option value.
    pub fn option(&self, key: &str) -> Option<&serde_json::Value> {
        self.options.get(key)
    }
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self::with_enabled(true)
    }
}

fn default_true() -> bool {
    true
}
