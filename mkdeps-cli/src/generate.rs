//! Rule generation: resolve, build the graph, render, write.
//!
//! Rules are rendered into memory first so that a failed resolution or a
//! rejected root never creates or truncates the output file.

use crate::config::Settings;
use anyhow::{Context, Result};
use mkdeps_core::{emitter, GoListResolver, GraphBuilder, UnitResolver};

/// Resolve `settings.packages` with `resolver` and render the rules.
pub async fn generate<R: UnitResolver>(resolver: &R, settings: &Settings) -> Result<String> {
    let request = settings.resolve_request();
    tracing::info!(
        packages = ?request.roots,
        dir = %request.base_dir.display(),
        tags = ?request.tags,
        timeout = ?request.timeout,
        "resolving packages"
    );

    let units = resolver
        .resolve(&request)
        .await
        .with_context(|| format!("loading packages {}", request.roots.join(" ")))?;

    let graph = GraphBuilder::new(&settings.base_dir).build(units)?;

    Ok(emitter::render(&graph, &settings.emit_options()))
}

/// Run the generator against the Go toolchain and write the result.
pub async fn run(settings: &Settings) -> Result<()> {
    let resolver = GoListResolver::new(&settings.go);
    let rules = generate(&resolver, settings).await?;
    settings.output.write(rules.as_bytes())
}
