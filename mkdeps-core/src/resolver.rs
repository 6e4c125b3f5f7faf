//! Build unit resolution.
//!
//! The resolver turns root identifiers into the closure of reachable units.
//! [`GoListResolver`] drives `go list -json -deps`; [`StaticResolver`] serves a
//! fixed unit list for library users and tests.
//!
//! # Architecture
//!
//! ```text
//! ResolveRequest -> UnitResolver -> Vec<BuildUnit> -> GraphBuilder
//! ```

use crate::error::{CoreError, Result};
use crate::types::{BuildUnit, ModuleInfo};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Default time allowed for resolution.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Everything a resolver needs for one run.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// Root identifiers or patterns, as given on the command line.
    pub roots: Vec<String>,
    /// Directory the toolchain runs in; output paths are relative to it.
    pub base_dir: PathBuf,
    /// Build tags passed to the toolchain.
    pub tags: Vec<String>,
    /// Upper bound for the whole resolution.
    pub timeout: Duration,
    /// Accepted for compatibility; has no effect on the graph.
    pub include_tests: bool,
}

impl ResolveRequest {
    pub fn new(roots: Vec<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            roots,
            base_dir: base_dir.into(),
            tags: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            include_tests: false,
        }
    }
}

/// Loads build units reachable from a set of roots.
///
/// Implementations flag requested units with `is_root` and fail with
/// [`CoreError::UnitNotFound`] when a root cannot be loaded and with
/// [`CoreError::ResolveTimeout`] when `request.timeout` expires.
#[allow(async_fn_in_trait)]
pub trait UnitResolver {
    async fn resolve(&self, request: &ResolveRequest) -> Result<Vec<BuildUnit>>;
}

// ============================================================================
// go list
// ============================================================================

/// Resolver backed by `go list -e -json -deps`.
#[derive(Debug, Clone)]
pub struct GoListResolver {
    go: PathBuf,
}

impl Default for GoListResolver {
    fn default() -> Self {
        Self::new("go")
    }
}

impl GoListResolver {
    pub fn new(go: impl Into<PathBuf>) -> Self {
        Self { go: go.into() }
    }

    /// Arguments passed to the go binary for `request`.
    pub fn command_args(request: &ResolveRequest) -> Vec<String> {
        let mut args = vec![
            "list".to_string(),
            "-e".to_string(),
            "-json".to_string(),
            "-deps".to_string(),
        ];
        if !request.tags.is_empty() {
            args.push("-tags".to_string());
            args.push(request.tags.join(","));
        }
        args.push("--".to_string());
        args.extend(request.roots.iter().cloned());
        args
    }
}

impl UnitResolver for GoListResolver {
    async fn resolve(&self, request: &ResolveRequest) -> Result<Vec<BuildUnit>> {
        if request.roots.is_empty() {
            return Err(CoreError::NoRoots);
        }
        if request.include_tests {
            tracing::debug!("test packages requested; they are not part of the graph");
        }

        let args = Self::command_args(request);
        tracing::debug!(
            go = %self.go.display(),
            dir = %request.base_dir.display(),
            ?args,
            "running go list"
        );

        let child = Command::new(&self.go)
            .args(&args)
            .current_dir(&request.base_dir)
            // go reports Dir and GoMod under $PWD when it names the working directory
            .env("PWD", &request.base_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CoreError::Resolve {
                message: format!("failed to run {}: {}", self.go.display(), e),
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(request.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                return Err(CoreError::ResolveTimeout {
                    timeout: request.timeout,
                })
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        let packages = parse_go_list(&output.stdout)?;

        if !output.status.success() {
            if packages.is_empty() {
                let message = if stderr.trim().is_empty() {
                    format!("go list exited with {}", output.status)
                } else {
                    stderr.trim().to_string()
                };
                return Err(CoreError::Resolve { message });
            }
            tracing::warn!("go list exited with {}: {}", output.status, stderr.trim());
        } else if !stderr.trim().is_empty() {
            tracing::warn!("go list: {}", stderr.trim());
        }

        let units = into_units(packages)?;
        tracing::debug!("go list resolved {} packages", units.len());
        Ok(units)
    }
}

/// One package object from `go list -json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoPackage {
    #[serde(default)]
    dir: Option<PathBuf>,
    import_path: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    go_files: Vec<String>,
    #[serde(default)]
    cgo_files: Vec<String>,
    #[serde(default)]
    imports: Vec<String>,
    #[serde(default)]
    module: Option<GoModule>,
    #[serde(default)]
    dep_only: bool,
    #[serde(default)]
    error: Option<GoPackageError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoModule {
    path: String,
    #[serde(default)]
    go_mod: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoPackageError {
    err: String,
}

/// Decode the concatenated JSON objects `go list -json` writes.
fn parse_go_list(stdout: &[u8]) -> Result<Vec<GoPackage>> {
    serde_json::Deserializer::from_slice(stdout)
        .into_iter::<GoPackage>()
        .map(|pkg| pkg.map_err(CoreError::from))
        .collect()
}

fn into_units(packages: Vec<GoPackage>) -> Result<Vec<BuildUnit>> {
    let mut units = Vec::with_capacity(packages.len());

    for pkg in packages {
        let is_root = !pkg.dep_only;
        if let Some(error) = &pkg.error {
            if is_root {
                return Err(CoreError::UnitNotFound {
                    unit: pkg.import_path,
                    reason: error.err.trim().to_string(),
                });
            }
            tracing::warn!("package {}: {}", pkg.import_path, error.err.trim());
        }

        let dir = pkg.dir.unwrap_or_default();
        let files = pkg
            .go_files
            .iter()
            .chain(pkg.cgo_files.iter())
            .map(|f| dir.join(f))
            .collect();

        let module = pkg.module.map(|m| ModuleInfo {
            path: m.path,
            descriptor: m.go_mod.unwrap_or_default(),
        });

        units.push(BuildUnit {
            id: pkg.import_path,
            kind: pkg.name,
            files,
            imports: pkg.imports,
            module,
            is_root,
        });
    }

    Ok(units)
}

// ============================================================================
// Static
// ============================================================================

/// Resolver over a fixed set of units.
///
/// Requested roots are looked up by identifier and flagged; every other unit
/// is returned as a dependency.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    units: Vec<BuildUnit>,
    delay: Option<Duration>,
}

impl StaticResolver {
    pub fn new(units: Vec<BuildUnit>) -> Self {
        Self { units, delay: None }
    }

    /// Simulate a slow toolchain.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn load(&self, request: &ResolveRequest) -> Result<Vec<BuildUnit>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let known: HashSet<&str> = self.units.iter().map(|u| u.id.as_str()).collect();
        if let Some(missing) = request.roots.iter().find(|r| !known.contains(r.as_str())) {
            return Err(CoreError::UnitNotFound {
                unit: missing.clone(),
                reason: "no such package".to_string(),
            });
        }

        let requested: HashSet<&str> = request.roots.iter().map(String::as_str).collect();
        Ok(self
            .units
            .iter()
            .cloned()
            .map(|mut unit| {
                unit.is_root = requested.contains(unit.id.as_str());
                unit
            })
            .collect())
    }
}

impl UnitResolver for StaticResolver {
    async fn resolve(&self, request: &ResolveRequest) -> Result<Vec<BuildUnit>> {
        if request.roots.is_empty() {
            return Err(CoreError::NoRoots);
        }
        tokio::time::timeout(request.timeout, self.load(request))
            .await
            .map_err(|_| CoreError::ResolveTimeout {
                timeout: request.timeout,
            })?
    }
}
