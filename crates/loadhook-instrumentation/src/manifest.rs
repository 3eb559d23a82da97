//! Package manifest lookup.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::warn;

use loadhook_core::error::{AppError, ErrorKind};
use loadhook_core::result::AppResult;

/// Reads and parses the package manifest under `base_dir`.
pub fn read_manifest(base_dir: &Path, manifest_file: &str) -> AppResult<Value> {
    let path = base_dir.join(manifest_file);

    let content = fs::read_to_string(&path).map_err(|e| {
        AppError::with_source(
            ErrorKind::Manifest,
            format!("Failed to read package manifest '{}'", path.display()),
            e,
        )
    })?;

    serde_json::from_str(&content).map_err(|e| {
        AppError::with_source(
            ErrorKind::Manifest,
            format!("Failed to parse package manifest '{}'", path.display()),
            e,
        )
    })
}

/// Reads the `version` field of the package manifest under `base_dir`.
///
/// Unreadable or malformed manifests are logged and treated as carrying no
/// version. A missing or non-string `version` field is silently absent.
pub fn extract_package_version(base_dir: &Path, manifest_file: &str) -> Option<String> {
    let manifest = match read_manifest(base_dir, manifest_file) {
        Ok(manifest) => manifest,
        Err(e) => {
            warn!(error = %e, "Package manifest unavailable, version unknown");
            return None;
        }
    };

    manifest
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string)
}
