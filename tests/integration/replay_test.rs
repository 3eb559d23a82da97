//! Re-enabling replays patches over recorded exports.

use loadhook::{FileDescriptor, Instrumentation, ModuleDescriptor, ModuleExports};

use crate::helpers::{CallLog, TestApp, native};

#[test]
fn test_disable_enable_replays_recorded_exports() {
    let app = TestApp::new();
    let patch = CallLog::default();
    let instrumentation = app.instrument(
        "replay",
        vec![ModuleDescriptor::new("pkg", ["^1.0.0"]).with_patch(patch.patch("pkg"))],
    );
    let base_dir = app.create_package("pkg", Some("1.2.3"));
    let exports = ModuleExports::new("pkg");

    app.load("pkg", Some(base_dir.as_path()), &exports);
    instrumentation.disable();
    instrumentation.enable().unwrap();

    let calls = patch.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].0.ptr_eq(&exports));
    assert_eq!(calls[1].1.as_deref(), Some("1.2.3"));
    assert_eq!(app.interceptor.hook_count(), 1);
}

#[test]
fn test_replay_covers_files() {
    let app = TestApp::new();
    let file_patch = CallLog::default();
    let instrumentation = app.instrument(
        "replay-files",
        vec![
            ModuleDescriptor::new("pkg", ["*"])
                .with_file(FileDescriptor::new("pkg/lib/client.js", ["*"]).with_patch(file_patch.patch("client"))),
        ],
    );
    let base_dir = app.create_package("pkg", Some("4.0.0"));
    let exports = ModuleExports::new("client");

    app.load(&native("pkg/lib/client.js"), Some(base_dir.as_path()), &exports);
    instrumentation.disable();
    instrumentation.enable().unwrap();

    let calls = file_patch.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].0.ptr_eq(&exports));
}

#[test]
fn test_enable_without_loads_replays_nothing() {
    let app = TestApp::new();
    let patch = CallLog::default();
    let instrumentation = app.instrument(
        "idle",
        vec![ModuleDescriptor::new("pkg", ["*"]).with_patch(patch.patch("pkg"))],
    );

    instrumentation.disable();
    instrumentation.enable().unwrap();

    assert_eq!(patch.count(), 0);
    assert_eq!(app.interceptor.hook_count(), 1);
}
