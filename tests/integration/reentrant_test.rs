//! Patches that load other modules while a load event is in flight.

use std::sync::Arc;

use parking_lot::Mutex;

use loadhook::{ModuleDescriptor, ModuleExports};

use crate::helpers::{CallLog, Patched, TestApp, patched_label};

#[test]
fn test_patch_loads_another_instrumented_module() {
    let app = TestApp::new();
    let inner_patch = CallLog::default();
    let inner_base = app.create_package("inner", Some("1.0.0"));
    let outer_base = app.create_package("outer", Some("2.0.0"));
    let inner_exports = ModuleExports::new("inner");
    let inner_dir = inner_base.clone();

    let nested = Arc::new(Mutex::new(Vec::new()));
    let outer_patch = {
        let loader = app.loader.clone();
        let raw = inner_exports.clone();
        let nested = nested.clone();
        move |exports: ModuleExports, _: Option<&str>| {
            let raw = raw.clone();
            let loaded = loader.load("inner", Some(inner_base.as_path()), move || raw);
            nested.lock().push(loaded);
            ModuleExports::new(Patched {
                label: "outer",
                original: exports,
            })
        }
    };

    let instrumentation = app.instrument(
        "reentrant",
        vec![
            ModuleDescriptor::new("outer", ["^2.0.0"]).with_patch(outer_patch),
            ModuleDescriptor::new("inner", ["^1.0.0"]).with_patch(inner_patch.patch("inner")),
        ],
    );

    let outer = app.load("outer", Some(outer_base.as_path()), &ModuleExports::new("outer"));

    assert_eq!(patched_label(&outer), Some("outer"));
    assert_eq!(inner_patch.count(), 1);
    assert!(inner_patch.calls()[0].0.ptr_eq(&inner_exports));

    let nested = nested.lock().clone();
    assert_eq!(nested.len(), 1);
    assert_eq!(patched_label(&nested[0]), Some("inner"));

    // The nested load went into the cache, so loading it again fires nothing.
    let inner = app.load("inner", Some(inner_dir.as_path()), &ModuleExports::new("other"));
    assert!(inner.ptr_eq(&nested[0]));
    assert_eq!(inner_patch.count(), 1);

    let state = instrumentation.module_state("inner").unwrap();
    assert!(state.exports.unwrap().ptr_eq(&inner_exports));
    assert_eq!(state.version.as_deref(), Some("1.0.0"));
    assert_eq!(instrumentation.module_state("outer").unwrap().version.as_deref(), Some("2.0.0"));
}
