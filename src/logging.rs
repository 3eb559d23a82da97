//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt};

use loadhook_core::config::logging::LoggingConfig;
use loadhook_core::error::AppError;
use loadhook_core::result::AppResult;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. The format is
/// `json` or, for any other value, human-readable `pretty` output. Fails if
/// a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> AppResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .try_init(),
        _ => fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };

    result.map_err(|e| AppError::configuration(format!("Failed to initialize logging: {e}")))
}
