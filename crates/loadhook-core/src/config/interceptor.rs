//! Load interceptor configuration.

use serde::{Deserialize, Serialize};

/// Settings of the process-wide load interceptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterceptorConfig {
    /// File name of the package manifest read from a module's base
    /// directory to discover its version.
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
    /// Warn when an instrumentation is enabled after its target module
    /// was already loaded.
    #[serde(default = "default_true")]
    pub warn_on_preloaded: bool,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            manifest_file: default_manifest_file(),
            warn_on_preloaded: true,
        }
    }
}

fn default_manifest_file() -> String {
    "package.json".to_string()
}

fn default_true() -> bool {
    true
}
