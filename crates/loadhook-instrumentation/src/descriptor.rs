//! Module and file descriptors: what an instrumentation patches.
//!
//! Descriptors are immutable once handed to an [`InstrumentationBase`];
//! the exports and versions observed at load time live in the lifecycle.
//!
//! [`InstrumentationBase`]: crate::lifecycle::InstrumentationBase

use std::fmt;
use std::path::MAIN_SEPARATOR;
use std::sync::Arc;

use crate::hooks::definitions::ModuleExports;
use crate::version;

/// Patches a module's exports. Receives the observed package version.
pub type PatchFn = Arc<dyn Fn(ModuleExports, Option<&str>) -> ModuleExports + Send + Sync>;

/// Reverts a previous patch on recorded exports.
pub type UnpatchFn = Arc<dyn Fn(&ModuleExports, Option<&str>) + Send + Sync>;

/// Behaviour shared by module and file descriptors.
pub trait VersionedTarget {
    /// Module name or file path this target applies to.
    fn name(&self) -> &str;

    /// Accepted version range expressions.
    fn supported_versions(&self) -> &[String];

    /// Whether prerelease versions may satisfy the ranges.
    fn include_prerelease(&self) -> bool;

    /// Patch applied on a matching load.
    fn patch(&self) -> Option<&PatchFn>;

    /// Reverts the patch when the instrumentation is disabled.
    fn unpatch(&self) -> Option<&UnpatchFn>;

    /// Whether `version` is accepted by this target.
    fn is_supported(&self, version: Option<&str>) -> bool {
        version::is_supported(self.supported_versions(), version, self.include_prerelease())
    }
}

/// Describes a package (or loader builtin) to instrument.
#[derive(Clone)]
pub struct ModuleDescriptor {
    name: String,
    supported_versions: Vec<String>,
    include_prerelease: bool,
    patch: Option<PatchFn>,
    unpatch: Option<UnpatchFn>,
    files: Vec<FileDescriptor>,
}

impl ModuleDescriptor {
    /// Creates a descriptor with no patch and no files.
    pub fn new<I, S>(name: impl Into<String>, supported_versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            supported_versions: supported_versions.into_iter().map(Into::into).collect(),
            include_prerelease: false,
            patch: None,
            unpatch: None,
            files: Vec::new(),
        }
    }

    /// Sets the patch applied to the package entry point.
    pub fn with_patch<F>(mut self, patch: F) -> Self
    where
        F: Fn(ModuleExports, Option<&str>) -> ModuleExports + Send + Sync + 'static,
    {
        self.patch = Some(Arc::new(patch));
        self
    }

    /// Sets the function reverting the patch.
    pub fn with_unpatch<F>(mut self, unpatch: F) -> Self
    where
        F: Fn(&ModuleExports, Option<&str>) + Send + Sync + 'static,
    {
        self.unpatch = Some(Arc::new(unpatch));
        self
    }

    /// Adds an internal file of the package.
    pub fn with_file(mut self, mut file: FileDescriptor) -> Self {
        file.inherited_prerelease = self.include_prerelease;
        self.files.push(file);
        self
    }

    /// Lets prerelease versions satisfy the ranges. Files without their own
    /// setting follow this flag.
    pub fn with_include_prerelease(mut self, include: bool) -> Self {
        self.include_prerelease = include;
        for file in &mut self.files {
            file.inherited_prerelease = include;
        }
        self
    }

    /// Internal files in registration order.
    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }
}

impl VersionedTarget for ModuleDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_versions(&self) -> &[String] {
        &self.supported_versions
    }

    fn include_prerelease(&self) -> bool {
        self.include_prerelease
    }

    fn patch(&self) -> Option<&PatchFn> {
        self.patch.as_ref()
    }

    fn unpatch(&self) -> Option<&UnpatchFn> {
        self.unpatch.as_ref()
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("supported_versions", &self.supported_versions)
            .field("include_prerelease", &self.include_prerelease)
            .field("has_patch", &self.patch.is_some())
            .field("has_unpatch", &self.unpatch.is_some())
            .field("files", &self.files)
            .finish()
    }
}

/// Describes one internal file of a package, e.g. `pkg/lib/client.js`.
#[derive(Clone)]
pub struct FileDescriptor {
    name: String,
    supported_versions: Vec<String>,
    include_prerelease: Option<bool>,
    inherited_prerelease: bool,
    patch: Option<PatchFn>,
    unpatch: Option<UnpatchFn>,
}

impl FileDescriptor {
    /// Creates a file descriptor. The name is normalized to the platform
    /// path style so it compares equal to names reported by the loader.
    pub fn new<I, S>(name: &str, supported_versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: normalize_path(name),
            supported_versions: supported_versions.into_iter().map(Into::into).collect(),
            include_prerelease: None,
            inherited_prerelease: false,
            patch: None,
            unpatch: None,
        }
    }

    pub fn with_patch<F>(mut self, patch: F) -> Self
    where
        F: Fn(ModuleExports, Option<&str>) -> ModuleExports + Send + Sync + 'static,
    {
        self.patch = Some(Arc::new(patch));
        self
    }

    pub fn with_unpatch<F>(mut self, unpatch: F) -> Self
    where
        F: Fn(&ModuleExports, Option<&str>) + Send + Sync + 'static,
    {
        self.unpatch = Some(Arc::new(unpatch));
        self
    }

    /// Overrides the prerelease flag inherited from the owning module.
    pub fn with_include_prerelease(mut self, include: bool) -> Self {
        self.include_prerelease = Some(include);
        self
    }
}

impl VersionedTarget for FileDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_versions(&self) -> &[String] {
        &self.supported_versions
    }

    fn include_prerelease(&self) -> bool {
        self.include_prerelease.unwrap_or(self.inherited_prerelease)
    }

    fn patch(&self) -> Option<&PatchFn> {
        self.patch.as_ref()
    }

    fn unpatch(&self) -> Option<&UnpatchFn> {
        self.unpatch.as_ref()
    }
}

impl fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("name", &self.name)
            .field("supported_versions", &self.supported_versions)
            .field("include_prerelease", &self.include_prerelease())
            .field("has_patch", &self.patch.is_some())
            .field("has_unpatch", &self.unpatch.is_some())
            .finish()
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == MAIN_SEPARATOR
}

/// Lexically normalizes a path in the platform style.
///
/// Repeated separators collapse, `.` segments are dropped and `..` removes
/// the preceding segment. A leading or trailing separator is kept. The
/// filesystem is never consulted.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let absolute = path.starts_with(is_separator);
    let trailing = path.ends_with(is_separator);

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(is_separator) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let separator = MAIN_SEPARATOR.to_string();
    let mut normalized = segments.join(&separator);

    if normalized.is_empty() {
        return if absolute { separator } else { ".".to_string() };
    }
    if absolute {
        normalized.insert(0, MAIN_SEPARATOR);
    }
    if trailing {
        normalized.push(MAIN_SEPARATOR);
    }
    normalized
}
