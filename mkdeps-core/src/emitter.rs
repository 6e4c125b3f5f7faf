//! Makefile rule emitter.
//!
//! Renders a [`DepGraph`] as four blocks separated by blank lines:
//!
//! ```text
//! .INTERMEDIATE: <root>            one per root
//!
//! <root>: <go.mod>                 one per root
//!
//! <unit>: <file> <file>            one per visited unit
//!
//! <dependent> <dependent>: <file>  one per dependency with dependents
//! ```
//!
//! Rule order inside the last two blocks does not matter to make. By default
//! it follows discovery order; [`EmitOptions::sort`] orders them by unit id.

use crate::graph::DepGraph;
use std::io::{self, Write};
use std::path::PathBuf;

const INTERMEDIATE: &str = ".INTERMEDIATE";

/// Rendering options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// Sort forward and reverse rules lexicographically.
    pub sort: bool,
}

/// Write all rule blocks for `graph` to `out`.
pub fn write_rules<W: Write>(graph: &DepGraph, options: &EmitOptions, out: &mut W) -> io::Result<()> {
    out.write_all(render(graph, options).as_bytes())
}

/// Render all rule blocks for `graph` into a string.
pub fn render(graph: &DepGraph, options: &EmitOptions) -> String {
    let mut output = String::new();

    for root in graph.roots() {
        output.push_str(&format!("{}: {}\n", INTERMEDIATE, root.id));
    }
    output.push('\n');

    for root in graph.roots() {
        output.push_str(&format!("{}: {}\n", root.id, root.descriptor.display()));
    }
    output.push('\n');

    let mut forward: Vec<(&String, &Vec<PathBuf>)> = graph.forward().iter().collect();
    if options.sort {
        forward.sort_by(|a, b| a.0.cmp(b.0));
    }
    for (id, files) in forward {
        output.push_str(&format!("{}: {}\n", id, join_paths(files)));
    }
    output.push('\n');

    let mut reverse: Vec<(&String, Vec<&str>)> = graph
        .reverse()
        .iter()
        .map(|(dep, dependents)| (dep, dependents.iter().map(String::as_str).collect()))
        .collect();
    if options.sort {
        reverse.sort_by(|a, b| a.0.cmp(b.0));
        for (_, dependents) in &mut reverse {
            dependents.sort_unstable();
        }
    }
    for (dep, dependents) in reverse {
        let files = graph.files(dep).unwrap_or_default();
        output.push_str(&format!("{}: {}\n", dependents.join(" "), join_paths(files)));
    }

    output
}

fn join_paths(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| f.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
