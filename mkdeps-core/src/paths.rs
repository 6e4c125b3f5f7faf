//! Lexical path rewriting.
//!
//! Rule files reference sources relative to the directory the build runs in,
//! so every absolute path reported by the resolver is rewritten against the
//! base directory before it is emitted.

use std::path::{Component, Path, PathBuf};

/// Rewrite `path` so it is relative to `base`.
///
/// Both paths are cleaned lexically (no filesystem access). Files outside
/// `base` get leading `..` components. Relative inputs are returned
/// unchanged, as are paths on a different root or drive.
pub fn relative_to(base: &Path, path: &Path) -> PathBuf {
    if !path.is_absolute() || !base.is_absolute() {
        return path.to_path_buf();
    }

    let base = clean(base);
    let target = clean(path);

    // Different prefix (e.g. another drive) cannot be expressed relatively.
    if base.first() != target.first() {
        return path.to_path_buf();
    }

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push(Component::ParentDir);
    }
    for component in &target[common..] {
        rel.push(component);
    }

    if rel.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        rel
    }
}

/// Rewrite every path in `files`, preserving order.
pub fn relative_all(base: &Path, files: &[PathBuf]) -> Vec<PathBuf> {
    files.iter().map(|f| relative_to(base, f)).collect()
}

fn clean(path: &Path) -> Vec<Component<'_>> {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // ".." at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn rel(base: &str, path: &str) -> String {
        relative_to(Path::new(base), Path::new(path))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_file_below_base() {
        assert_eq!(rel("/src/app", "/src/app/cmd/tool/main.go"), "cmd/tool/main.go");
    }

    #[test]
    fn test_file_outside_base() {
        assert_eq!(rel("/src/app/sub", "/src/app/go.mod"), "../go.mod");
        assert_eq!(rel("/src/app", "/other/lib/x.go"), "../../other/lib/x.go");
    }

    #[test]
    fn test_same_path_is_dot() {
        assert_eq!(rel("/src/app", "/src/app"), ".");
    }

    #[test]
    fn test_cleans_dot_components() {
        assert_eq!(rel("/src/./app/", "/src/app/x/../y/./z.go"), "y/z.go");
        assert_eq!(rel("/", "/../a.go"), "a.go");
    }

    #[test]
    fn test_relative_input_untouched() {
        assert_eq!(rel("/src/app", "already/rel.go"), "already/rel.go");
    }

    #[test]
    fn test_relative_all_keeps_order() {
        let files = vec![
            PathBuf::from("/src/app/z.go"),
            PathBuf::from("/src/app/a.go"),
        ];
        let out = relative_all(Path::new("/src/app"), &files);
        assert_eq!(out, vec![PathBuf::from("z.go"), PathBuf::from("a.go")]);
    }
}
