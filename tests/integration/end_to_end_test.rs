//! Package root and internal file patched through the shared interceptor.

use loadhook::{FileDescriptor, Instrumentation, ModuleDescriptor, ModuleExports};

use crate::helpers::{CallLog, TestApp, native, patched_label};

#[test]
fn test_root_and_file_patched_then_unpatched() {
    let app = TestApp::new();
    let root_patch = CallLog::default();
    let root_unpatch = CallLog::default();
    let file_patch = CallLog::default();
    let file_unpatch = CallLog::default();

    let instrumentation = app.instrument(
        "e2e",
        vec![
            ModuleDescriptor::new("pkg", ["*"])
                .with_patch(root_patch.patch("root"))
                .with_unpatch(root_unpatch.unpatch())
                .with_file(
                    FileDescriptor::new("pkg/internal.js", ["*"])
                        .with_patch(file_patch.patch("file"))
                        .with_unpatch(file_unpatch.unpatch()),
                ),
        ],
    );
    let base_dir = app.create_package("pkg", Some("1.0.0"));
    let exports_a = ModuleExports::new("A");
    let exports_b = ModuleExports::new("B");

    let root = app.load("pkg", Some(base_dir.as_path()), &exports_a);
    let file = app.load(&native("pkg/internal.js"), Some(base_dir.as_path()), &exports_b);

    assert_eq!(patched_label(&root), Some("root"));
    assert_eq!(patched_label(&file), Some("file"));

    let root_calls = root_patch.calls();
    assert_eq!(root_calls.len(), 1);
    assert!(root_calls[0].0.ptr_eq(&exports_a));
    assert_eq!(root_calls[0].1.as_deref(), Some("1.0.0"));

    let file_calls = file_patch.calls();
    assert_eq!(file_calls.len(), 1);
    assert!(file_calls[0].0.ptr_eq(&exports_b));

    instrumentation.disable();

    let root_calls = root_unpatch.calls();
    assert_eq!(root_calls.len(), 1);
    assert!(root_calls[0].0.ptr_eq(&exports_a));
    let file_calls = file_unpatch.calls();
    assert_eq!(file_calls.len(), 1);
    assert!(file_calls[0].0.ptr_eq(&exports_b));
    assert_eq!(file_calls[0].1.as_deref(), Some("1.0.0"));
}

#[test]
fn test_unsupported_package_version_passes_through() {
    let app = TestApp::new();
    let patch = CallLog::default();
    let _instrumentation = app.instrument(
        "gated",
        vec![ModuleDescriptor::new("pkg", [">=1.0.0 <2.0.0"]).with_patch(patch.patch("root"))],
    );
    let base_dir = app.create_package("pkg", Some("2.1.0"));
    let exports = ModuleExports::new("raw");

    let loaded = app.load("pkg", Some(base_dir.as_path()), &exports);

    assert!(loaded.ptr_eq(&exports));
    assert_eq!(patch.count(), 0);
}

#[test]
fn test_missing_version_only_matches_wildcard() {
    let app = TestApp::new();
    let gated = CallLog::default();
    let any = CallLog::default();
    let _instrumentation = app.instrument(
        "no-version",
        vec![
            ModuleDescriptor::new("pkg", ["^1.0.0"]).with_patch(gated.patch("gated")),
            ModuleDescriptor::new("pkg", ["*"]).with_patch(any.patch("any")),
        ],
    );
    let base_dir = app.create_package("pkg", None);

    let loaded = app.load("pkg", Some(base_dir.as_path()), &ModuleExports::new("raw"));

    assert_eq!(patched_label(&loaded), Some("any"));
    assert_eq!(gated.count(), 0);
    assert_eq!(any.calls()[0].1, None);
}

#[test]
fn test_instrumentations_fold_in_registration_order() {
    let app = TestApp::new();
    let first = CallLog::default();
    let second = CallLog::default();
    let _a = app.instrument("first", vec![ModuleDescriptor::new("pkg", ["*"]).with_patch(first.patch("first"))]);
    let _b = app.instrument("second", vec![ModuleDescriptor::new("pkg", ["*"]).with_patch(second.patch("second"))]);
    let base_dir = app.create_package("pkg", Some("3.0.0"));
    let exports = ModuleExports::new("raw");

    let loaded = app.load("pkg", Some(base_dir.as_path()), &exports);

    assert_eq!(patched_label(&loaded), Some("second"));
    assert!(first.calls()[0].0.ptr_eq(&exports));
    assert_eq!(patched_label(&second.calls()[0].0), Some("first"));
}
