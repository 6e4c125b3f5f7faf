//! Data models for resolved build units.
//!
//! A build unit is a Go package as reported by the toolchain: its import path,
//! package name, source files, imports and owning module.

use std::path::PathBuf;

/// Package name that marks an independently buildable program.
pub const MAIN_KIND: &str = "main";

/// The module a unit belongs to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Module path, e.g. "example.com/app".
    pub path: String,
    /// Absolute path of the module descriptor (`go.mod`).
    pub descriptor: PathBuf,
}

impl ModuleInfo {
    pub fn new(path: impl Into<String>, descriptor: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            descriptor: descriptor.into(),
        }
    }
}

/// A resolved build unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildUnit {
    /// Unique identifier (import path).
    pub id: String,
    /// Declared kind (package name). Only `main` units are valid roots.
    pub kind: String,
    /// Absolute source file paths, in toolchain order.
    pub files: Vec<PathBuf>,
    /// Identifiers of imported units.
    pub imports: Vec<String>,
    /// Owning module, absent for standard library or GOPATH packages.
    pub module: Option<ModuleInfo>,
    /// Whether the unit was explicitly requested.
    pub is_root: bool,
}

impl BuildUnit {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports = imports.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_module(mut self, module: ModuleInfo) -> Self {
        self.module = Some(module);
        self
    }

    pub fn root(mut self) -> Self {
        self.is_root = true;
        self
    }

    /// Whether this unit builds to a program.
    pub fn is_main(&self) -> bool {
        self.kind == MAIN_KIND
    }

    /// Module path, if the unit belongs to a non-empty module.
    pub fn module_path(&self) -> Option<&str> {
        self.module
            .as_ref()
            .map(|m| m.path.as_str())
            .filter(|p| !p.is_empty())
    }

    /// Whether an import edge from `self` to `dep` stays inside one module.
    ///
    /// Both sides must carry a non-empty module path.
    pub fn shares_module_with(&self, dep: &BuildUnit) -> bool {
        match (self.module_path(), dep.module_path()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}
