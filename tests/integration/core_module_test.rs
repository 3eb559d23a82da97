//! Loader builtins: no base directory, no manifest.

use loadhook::{Instrumentation, ModuleDescriptor, ModuleExports, ModuleLoader};

use crate::helpers::{CallLog, TestApp, patched_label};

#[test]
fn test_builtin_takes_no_base_dir_branch() {
    let app = TestApp::new();
    let patch = CallLog::default();
    // A range an absent version can never satisfy: builtins are not gated.
    let instrumentation = app.instrument(
        "fs",
        vec![ModuleDescriptor::new("fs", ["^1.0.0"]).with_patch(patch.patch("fs"))],
    );

    // A same-named package records a version first.
    let vendored = app.create_package("fs", Some("1.0.0"));
    app.load("fs", Some(vendored.as_path()), &ModuleExports::new("vendored"));
    assert_eq!(patch.calls()[0].1.as_deref(), Some("1.0.0"));
    app.loader.evict("fs");

    let exports = ModuleExports::new("fs");
    let loaded = app.load("fs", None, &exports);

    assert_eq!(patched_label(&loaded), Some("fs"));
    assert_eq!(patch.count(), 2);
    assert_eq!(patch.calls()[1].1, None);
    let state = instrumentation.module_state("fs").unwrap();
    assert!(state.exports.unwrap().ptr_eq(&exports));
    assert_eq!(state.version.as_deref(), Some("1.0.0"));
}

#[test]
fn test_builtin_sub_path_needs_exact_registration() {
    let app = TestApp::new();
    let fs = CallLog::default();
    let promises = CallLog::default();
    let _instrumentation = app.instrument(
        "fs",
        vec![
            ModuleDescriptor::new("fs", ["*"]).with_patch(fs.patch("fs")),
            ModuleDescriptor::new("fs/promises", ["*"]).with_patch(promises.patch("promises")),
        ],
    );

    let loaded = app.load("fs/promises", None, &ModuleExports::new("promises"));

    assert_eq!(patched_label(&loaded), Some("promises"));
    assert_eq!(fs.count(), 0);
    assert_eq!(promises.count(), 1);
}

#[test]
fn test_builtin_disabled_records_only() {
    let app = TestApp::new();
    let patch = CallLog::default();
    let instrumentation = app.instrument(
        "fs",
        vec![ModuleDescriptor::new("fs", ["*"]).with_patch(patch.patch("fs"))],
    );
    instrumentation.disable();

    let loaded = app.load("fs", None, &ModuleExports::new("fs"));

    assert_eq!(patched_label(&loaded), None);
    assert_eq!(patch.count(), 0);
    assert!(app.loader.is_loaded("fs"));
    assert!(instrumentation.module_state("fs").unwrap().exports.is_some());
}
