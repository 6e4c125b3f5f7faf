//! mkdeps configuration loading from `.mkdeps.toml`.
//!
//! The file is looked up in the package directory and is optional. Command
//! line flags override anything set here.
//!
//! # Example Configuration
//!
//! ```toml
//! [resolver]
//! go = "/usr/local/go/bin/go"
//! tags = ["netgo", "osusergo"]
//! timeout = "90s"
//!
//! [output]
//! sort = true
//! ```

use crate::duration::parse_duration;
use crate::output::OutputTarget;
use mkdeps_core::{EmitOptions, ResolveRequest};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file.
pub const CONFIG_FILE: &str = ".mkdeps.toml";

/// Root configuration structure loaded from `.mkdeps.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct MkdepsConfig {
    /// How packages are resolved.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// How rules are written.
    #[serde(default)]
    pub output: OutputSettings,
}

/// Resolver section.
#[derive(Debug, Deserialize, Default)]
pub struct ResolverConfig {
    /// Go binary to run. Defaults to `go` from `PATH`.
    #[serde(default)]
    pub go: Option<PathBuf>,

    /// Build tags applied when no `--tags` flag is given.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Resolution timeout as a duration string, e.g. `"90s"`.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Same as `--include-tests`.
    #[serde(default)]
    pub include_tests: bool,
}

/// Output section.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Sort forward and reverse rules by package.
    #[serde(default)]
    pub sort: bool,
}

impl MkdepsConfig {
    /// Load configuration from `.mkdeps.toml` in the given directory.
    ///
    /// If the config file doesn't exist or can't be parsed, returns defaults.
    /// Parse errors are logged as warnings but don't cause failures.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => {
                        tracing::debug!("loaded {}", config_path.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", CONFIG_FILE, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", CONFIG_FILE, e);
                }
            }
        }
        Self::default()
    }

    /// Configured timeout. Invalid values are logged and ignored.
    pub fn timeout(&self) -> Option<Duration> {
        let raw = self.resolver.timeout.as_deref()?;
        match parse_duration(raw) {
            Ok(timeout) => Some(timeout),
            Err(e) => {
                tracing::warn!("Ignoring resolver.timeout in {}: {}", CONFIG_FILE, e);
                None
            }
        }
    }

    pub fn go_binary(&self) -> Option<&Path> {
        self.resolver.go.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.resolver.tags
    }

    pub fn include_tests(&self) -> bool {
        self.resolver.include_tests
    }

    pub fn sort(&self) -> bool {
        self.output.sort
    }
}

/// Effective settings for one run, after merging flags and configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub packages: Vec<String>,
    pub base_dir: PathBuf,
    pub tags: Vec<String>,
    pub timeout: Duration,
    pub include_tests: bool,
    pub go: PathBuf,
    pub output: OutputTarget,
    pub sort: bool,
}

impl Settings {
    pub fn resolve_request(&self) -> ResolveRequest {
        ResolveRequest {
            roots: self.packages.clone(),
            base_dir: self.base_dir.clone(),
            tags: self.tags.clone(),
            timeout: self.timeout,
            include_tests: self.include_tests,
        }
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions { sort: self.sort }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = MkdepsConfig::default();
        assert!(config.go_binary().is_none());
        assert!(config.tags().is_empty());
        assert!(config.timeout().is_none());
        assert!(!config.include_tests());
        assert!(!config.sort());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[resolver]
go = "/opt/go/bin/go"
tags = ["netgo", "osusergo"]
timeout = "1m30s"
include_tests = true

[output]
sort = true
"#;
        let config: MkdepsConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.go_binary(), Some(Path::new("/opt/go/bin/go")));
        assert_eq!(config.tags(), &["netgo".to_string(), "osusergo".to_string()]);
        assert_eq!(config.timeout(), Some(Duration::from_secs(90)));
        assert!(config.include_tests());
        assert!(config.sort());
    }

    #[test]
    fn test_invalid_timeout_ignored() {
        let config: MkdepsConfig = toml::from_str("[resolver]\ntimeout = \"soon\"\n").unwrap();
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let config = MkdepsConfig::load(dir.path());
        assert!(config.tags().is_empty());
    }

    #[test]
    fn test_load_malformed_file_uses_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[resolver\ntags = 3").unwrap();
        let config = MkdepsConfig::load(dir.path());
        assert!(config.tags().is_empty());
        assert!(!config.sort());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[resolver]\ntags = [\"integration\"]\n",
        )
        .unwrap();
        let config = MkdepsConfig::load(dir.path());
        assert_eq!(config.tags(), &["integration".to_string()]);
    }

    #[test]
    fn test_settings_into_request() {
        let settings = Settings {
            packages: vec!["./cmd/app".to_string()],
            base_dir: PathBuf::from("/src/app"),
            tags: vec!["netgo".to_string()],
            timeout: Duration::from_secs(5),
            include_tests: true,
            go: PathBuf::from("go"),
            output: OutputTarget::Stdout,
            sort: true,
        };

        let request = settings.resolve_request();
        assert_eq!(request.roots, vec!["./cmd/app"]);
        assert_eq!(request.base_dir, PathBuf::from("/src/app"));
        assert_eq!(request.tags, vec!["netgo"]);
        assert_eq!(request.timeout, Duration::from_secs(5));
        assert!(request.include_tests);
        assert!(settings.emit_options().sort);
    }
}
