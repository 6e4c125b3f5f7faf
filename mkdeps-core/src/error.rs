//! Error types for mkdeps-core.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for mkdeps-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while resolving units or building the graph.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The resolver did not finish within the configured timeout.
    #[error("package resolution timed out after {timeout:?}")]
    ResolveTimeout {
        /// Timeout that expired.
        timeout: Duration,
    },

    /// A requested root could not be found or loaded.
    #[error("cannot load package {unit}: {reason}")]
    UnitNotFound {
        /// Identifier of the requested root.
        unit: String,
        /// Message reported by the toolchain.
        reason: String,
    },

    /// Any other resolver failure.
    #[error("package resolution failed: {message}")]
    Resolve {
        /// Description of the failure.
        message: String,
    },

    /// A root is not an independently buildable program.
    #[error("only main packages are accepted as roots: {unit} is package {kind}")]
    NotMain {
        /// Identifier of the offending root.
        unit: String,
        /// Declared package name.
        kind: String,
    },

    /// A root does not belong to any module.
    #[error("package {unit} is not part of a module")]
    NoModule {
        /// Identifier of the offending root.
        unit: String,
    },

    /// No roots were requested or resolved.
    #[error("no root packages to process")]
    NoRoots,

    /// IO error while running the resolver or writing rules.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed resolver output.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::NotMain {
            unit: "example.com/app/lib".to_string(),
            kind: "lib".to_string(),
        };
        assert!(err.to_string().contains("example.com/app/lib"));
        assert!(err.to_string().contains("package lib"));

        let err = CoreError::ResolveTimeout {
            timeout: Duration::from_millis(250),
        };
        assert!(err.to_string().contains("250ms"));
    }
}
