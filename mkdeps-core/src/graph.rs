//! Dependency graph construction.
//!
//! Turns the resolver's unit list into the two indices the rule emitter needs:
//!
//! - **forward**: unit id -> its source files, relative to the base directory
//! - **reverse**: dependency id -> the units that import it
//!
//! Only edges that stay inside one module are followed. Edges into another
//! module (or into the standard library) are dropped; `go.mod` tracking covers
//! those.
//!
//! Import cycles inside a module are not detected. They show up as symmetric
//! forward and reverse rules.

use crate::error::{CoreError, Result};
use crate::paths::{relative_all, relative_to};
use crate::types::BuildUnit;
use indexmap::IndexMap;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

/// A requested program and its module descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootEntry {
    pub id: String,
    /// Module descriptor, relative to the base directory.
    pub descriptor: PathBuf,
}

/// Forward and reverse dependency indices for one run.
#[derive(Debug, Clone, Default)]
pub struct DepGraph {
    roots: Vec<RootEntry>,
    forward: IndexMap<String, Vec<PathBuf>>,
    reverse: IndexMap<String, Vec<String>>,
}

impl DepGraph {
    /// Roots in resolution order.
    pub fn roots(&self) -> &[RootEntry] {
        &self.roots
    }

    /// Visited units and their relative files, in discovery order.
    pub fn forward(&self) -> &IndexMap<String, Vec<PathBuf>> {
        &self.forward
    }

    /// Dependencies and their dependents, in discovery order.
    pub fn reverse(&self) -> &IndexMap<String, Vec<String>> {
        &self.reverse
    }

    pub fn files(&self, id: &str) -> Option<&[PathBuf]> {
        self.forward.get(id).map(Vec::as_slice)
    }

    pub fn dependents(&self, id: &str) -> Option<&[String]> {
        self.reverse.get(id).map(Vec::as_slice)
    }
}

/// Builds a [`DepGraph`] from resolved units.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    base_dir: PathBuf,
}

impl GraphBuilder {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Validate the roots and index every unit reachable from them through
    /// same-module imports.
    ///
    /// Fails before indexing anything if a root is not `main` or has no module.
    pub fn build(&self, units: Vec<BuildUnit>) -> Result<DepGraph> {
        let mut graph = DepGraph::default();

        let mut root_ids: Vec<String> = Vec::new();
        for unit in units.iter().filter(|u| u.is_root) {
            if !unit.is_main() {
                return Err(CoreError::NotMain {
                    unit: unit.id.clone(),
                    kind: unit.kind.clone(),
                });
            }
            let descriptor = match (&unit.module, unit.module_path()) {
                (Some(module), Some(_)) if !module.descriptor.as_os_str().is_empty() => {
                    &module.descriptor
                }
                _ => {
                    return Err(CoreError::NoModule {
                        unit: unit.id.clone(),
                    })
                }
            };
            if root_ids.contains(&unit.id) {
                continue;
            }
            graph.roots.push(RootEntry {
                id: unit.id.clone(),
                descriptor: relative_to(&self.base_dir, descriptor),
            });
            root_ids.push(unit.id.clone());
        }
        if root_ids.is_empty() {
            return Err(CoreError::NoRoots);
        }

        let index: HashMap<&str, &BuildUnit> = units.iter().map(|u| (u.id.as_str(), u)).collect();

        for id in &root_ids {
            let unit = index[id.as_str()];
            graph
                .forward
                .insert(unit.id.clone(), relative_all(&self.base_dir, &unit.files));
        }

        let mut queue: VecDeque<&str> = root_ids.iter().map(String::as_str).collect();
        while let Some(id) = queue.pop_front() {
            let unit = index[id];
            for dep_id in &unit.imports {
                let Some(dep) = index.get(dep_id.as_str()).copied() else {
                    tracing::trace!("{} imports unresolved {}", unit.id, dep_id);
                    continue;
                };
                if !unit.shares_module_with(dep) {
                    continue;
                }
                if !graph.forward.contains_key(dep_id) {
                    if dep.files.is_empty() {
                        tracing::debug!("skipping {}: no source files", dep.id);
                        continue;
                    }
                    graph
                        .forward
                        .insert(dep.id.clone(), relative_all(&self.base_dir, &dep.files));
                    queue.push_back(dep.id.as_str());
                }
                graph
                    .reverse
                    .entry(dep.id.clone())
                    .or_default()
                    .push(unit.id.clone());
            }
        }

        tracing::debug!(
            roots = graph.roots.len(),
            units = graph.forward.len(),
            dependencies = graph.reverse.len(),
            "dependency graph built"
        );
        Ok(graph)
    }
}
