//! Configuration driving interceptors and instrumentations.

use std::fs;
use std::sync::Arc;

use loadhook::prelude::InstrumentationConfig;
use loadhook::{
    AppConfig, AutoLoaderOptions, HostLoader, Instrumentation, InstrumentationBase,
    LoadInterceptor, ModuleDescriptor, ModuleExports, register_instrumentations,
};

use crate::helpers::{CallLog, patched_label};

const CONFIG: &str = r#"
[logging]
level = "debug"
format = "json"

[interceptor]
manifest_file = "manifest.json"

[instrumentations.http]
enabled = false
max_depth = 3
"#;

fn write_config() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("loadhook.toml"), CONFIG).unwrap();
    dir
}

#[test]
fn test_config_file_drives_lifecycle() {
    let dir = write_config();
    let config = AppConfig::load(dir.path().join("loadhook.toml")).unwrap();
    assert_eq!(config.logging.format, "json");
    assert!(config.interceptor.warn_on_preloaded);

    let loader = Arc::new(HostLoader::new());
    let interceptor = LoadInterceptor::with_config(loader.clone(), config.interceptor.clone()).unwrap();
    let patch = CallLog::default();
    let http = InstrumentationBase::from_app_config(
        &config,
        "http",
        "0.1.0",
        vec![ModuleDescriptor::new("http-client", ["^1.0.0"]).with_patch(patch.patch("http"))],
        interceptor.clone(),
    )
    .unwrap();
    assert!(!http.is_enabled());
    assert_eq!(http.config().option("max_depth"), Some(&serde_json::json!(3)));

    let registered = register_instrumentations(AutoLoaderOptions::new(vec![Arc::new(http.clone())])).unwrap();
    assert!(http.is_enabled());

    let package = dir.path().join("http-client");
    fs::create_dir_all(&package).unwrap();
    fs::write(package.join("manifest.json"), r#"{"version": "1.4.0"}"#).unwrap();

    let loaded = loader.load("http-client", Some(package.as_path()), || ModuleExports::new("client"));
    assert_eq!(patched_label(&loaded), Some("http"));
    assert_eq!(patch.calls()[0].1.as_deref(), Some("1.4.0"));

    registered.unload();
    assert!(!http.is_enabled());
}

#[test]
fn test_init_with_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let (config, interceptor) = loadhook::init(dir.path().join("absent.toml")).unwrap();

    assert_eq!(config.interceptor.manifest_file, "package.json");
    assert_eq!(config.instrumentation("anything"), InstrumentationConfig::default());
    assert!(Arc::ptr_eq(&interceptor, &LoadInterceptor::global().unwrap()));
}
