//! mkdeps core - Go package graphs as Makefile dependency rules.
//!
//! Given a set of `main` packages, this crate resolves their dependencies with
//! the Go toolchain and renders rules a Makefile can include so that only
//! programs whose sources changed get rebuilt.
//!
//! # Pipeline
//!
//! ```text
//! UnitResolver -> GraphBuilder -> emitter -> io::Write
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use mkdeps_core::{emitter, EmitOptions, GoListResolver, GraphBuilder, ResolveRequest, UnitResolver};
//!
//! # async fn example() -> mkdeps_core::Result<()> {
//! let request = ResolveRequest::new(vec!["./cmd/...".to_string()], "/src/app");
//! let units = GoListResolver::default().resolve(&request).await?;
//! let graph = GraphBuilder::new(&request.base_dir).build(units)?;
//! print!("{}", emitter::render(&graph, &EmitOptions::default()));
//! # Ok(())
//! # }
//! ```

pub mod emitter;
pub mod error;
pub mod graph;
pub mod paths;
pub mod resolver;
pub mod types;

pub use emitter::EmitOptions;
pub use error::{CoreError, Result};
pub use graph::{DepGraph, GraphBuilder, RootEntry};
pub use resolver::{GoListResolver, ResolveRequest, StaticResolver, UnitResolver, DEFAULT_TIMEOUT};
pub use types::{BuildUnit, ModuleInfo};
