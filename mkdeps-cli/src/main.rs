//! mkdeps - Makefile dependency rules for Go programs
//!
//! Resolves the packages behind a set of `main` packages and prints rules a
//! Makefile can include, so that only programs whose sources changed are
//! rebuilt.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod duration;
mod generate;
mod output;

use config::{MkdepsConfig, Settings};
use duration::parse_duration;
use mkdeps_core::DEFAULT_TIMEOUT;
use output::OutputTarget;

/// Generate Makefile dependency rules for Go main packages.
///
/// Prints `.INTERMEDIATE` markers, go.mod mappings, per-package source rules
/// and reverse rules for every package the given programs import from their
/// own module.
#[derive(Parser, Debug)]
#[command(name = "mkdeps")]
#[command(author, version)]
#[command(about = "Generate Makefile dependency rules for Go main packages")]
#[command(after_help = "Examples:
  mkdeps ./cmd/...                    Rules for every program under cmd/
  mkdeps -o deps.mk ./cmd/server      Write rules to deps.mk
  mkdeps -t netgo,osusergo ./cmd/cli  Resolve with build tags

Settings may also be placed in .mkdeps.toml in the package directory.")]
pub struct Cli {
    /// Main packages (import paths or patterns) to generate rules for
    #[arg(required = true, value_name = "PACKAGE")]
    packages: Vec<String>,

    /// Build tags to include (comma-separated)
    #[arg(short, long, value_delimiter = ',', value_name = "TAGS")]
    tags: Vec<String>,

    /// Load packages from this directory instead of the current one
    #[arg(short = 'C', long, value_name = "DIR")]
    pkgdir: Option<PathBuf>,

    /// Include related test packages (accepted for compatibility, no effect)
    #[arg(long)]
    include_tests: bool,

    /// Maximum time allowed for package resolution (e.g. 90s, 2m) [default: 2m]
    #[arg(long, value_parser = parse_duration, value_name = "DURATION")]
    timeout: Option<Duration>,

    /// Destination of the rules ("-" for stdout)
    #[arg(short, long, default_value = "-", value_name = "PATH")]
    output: OutputTarget,

    /// Go binary used to resolve packages
    #[arg(long, env = "MKDEPS_GO", value_name = "PATH")]
    go: Option<PathBuf>,

    /// Sort package rules by import path
    #[arg(long)]
    sort: bool,

    /// Enable verbose output (debug logging)
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

/// Absolute package directory, lexically joined onto the working directory.
fn resolve_base_dir(pkgdir: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let pwd = std::env::var_os("PWD").map(PathBuf::from);
    let wd = working_dir(pwd, cwd);
    Ok(match pkgdir {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => wd.join(dir),
        None => wd,
    })
}

/// Prefer `$PWD` over the symlink-resolved `cwd` when both name the same
/// directory, so paths match the ones the go command reports.
fn working_dir(pwd: Option<PathBuf>, cwd: PathBuf) -> PathBuf {
    let Some(pwd) = pwd.filter(|p| p.is_absolute()) else {
        return cwd;
    };
    match (std::fs::canonicalize(&pwd), std::fs::canonicalize(&cwd)) {
        (Ok(a), Ok(b)) if a == b => pwd,
        _ => cwd,
    }
}

/// Merge flags over configuration over defaults.
fn settings(cli: Cli, config: &MkdepsConfig, base_dir: PathBuf) -> Settings {
    let tags: Vec<String> = if cli.tags.is_empty() {
        config.tags().to_vec()
    } else {
        cli.tags
    };

    Settings {
        packages: cli.packages,
        base_dir,
        tags: tags.into_iter().filter(|t| !t.is_empty()).collect(),
        timeout: cli
            .timeout
            .or_else(|| config.timeout())
            .unwrap_or(DEFAULT_TIMEOUT),
        include_tests: cli.include_tests || config.include_tests(),
        go: cli
            .go
            .or_else(|| config.go_binary().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("go")),
        output: cli.output,
        sort: cli.sort || config.sort(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let base_dir = resolve_base_dir(cli.pkgdir.as_deref())?;
    let config = MkdepsConfig::load(&base_dir);
    let settings = settings(cli, &config, base_dir);

    generate::run(&settings).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mkdeps").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["./cmd/app"]);
        let settings = settings(cli, &MkdepsConfig::default(), PathBuf::from("/src/app"));

        assert_eq!(settings.packages, vec!["./cmd/app"]);
        assert!(settings.tags.is_empty());
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
        assert_eq!(settings.output, OutputTarget::Stdout);
        assert!(!settings.include_tests);
        assert!(!settings.sort);
    }

    #[test]
    fn test_flags() {
        let cli = parse(&[
            "-t",
            "netgo,osusergo",
            "--timeout",
            "1m30s",
            "-o",
            "deps.mk",
            "--go",
            "/opt/go/bin/go",
            "--include-tests",
            "--sort",
            "./cmd/a",
            "./cmd/b",
        ]);
        let settings = settings(cli, &MkdepsConfig::default(), PathBuf::from("/src/app"));

        assert_eq!(settings.packages, vec!["./cmd/a", "./cmd/b"]);
        assert_eq!(settings.tags, vec!["netgo", "osusergo"]);
        assert_eq!(settings.timeout, Duration::from_secs(90));
        assert_eq!(settings.output, OutputTarget::File(PathBuf::from("deps.mk")));
        assert_eq!(settings.go, PathBuf::from("/opt/go/bin/go"));
        assert!(settings.include_tests);
        assert!(settings.sort);
    }

    #[test]
    fn test_flags_override_config() {
        let config: MkdepsConfig = toml::from_str(
            r#"
[resolver]
go = "/config/go"
tags = ["fromconfig"]
timeout = "10s"

[output]
sort = true
"#,
        )
        .unwrap();

        let merged = settings(parse(&["./cmd/app"]), &config, PathBuf::from("/src/app"));
        assert_eq!(merged.tags, vec!["fromconfig"]);
        assert_eq!(merged.timeout, Duration::from_secs(10));
        assert!(merged.sort);

        let cli = parse(&["-t", "cli", "--timeout", "3s", "--go", "/cli/go", "./cmd/app"]);
        let merged = settings(cli, &config, PathBuf::from("/src/app"));
        assert_eq!(merged.tags, vec!["cli"]);
        assert_eq!(merged.timeout, Duration::from_secs(3));
        assert_eq!(merged.go, PathBuf::from("/cli/go"));
    }

    #[test]
    fn test_empty_tags_dropped() {
        let cli = parse(&["--tags", "", "./cmd/app"]);
        let settings = settings(cli, &MkdepsConfig::default(), PathBuf::from("/src/app"));
        assert!(settings.tags.is_empty());
    }

    #[test]
    fn test_packages_required() {
        assert!(Cli::try_parse_from(["mkdeps"]).is_err());
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        assert!(Cli::try_parse_from(["mkdeps", "--timeout", "30", "./cmd/app"]).is_err());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["mkdeps", "-v", "-q", "./cmd/app"]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_working_dir_prefers_matching_pwd() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        let link = dir.path().join("link");
        std::fs::create_dir(&real).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();
        let cwd = std::fs::canonicalize(&real).unwrap();

        assert_eq!(working_dir(Some(link.clone()), cwd.clone()), link);
        assert_eq!(working_dir(None, cwd.clone()), cwd);
        assert_eq!(working_dir(Some(PathBuf::from("link")), cwd.clone()), cwd);
        assert_eq!(working_dir(Some(dir.path().to_path_buf()), cwd.clone()), cwd);
    }

    #[test]
    fn test_relative_pkgdir_is_joined() {
        let base = resolve_base_dir(Some(Path::new("sub/dir"))).unwrap();
        assert!(base.is_absolute());
        assert!(base.ends_with("sub/dir"));
    }
}
