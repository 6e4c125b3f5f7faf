//! Output destination selection.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

/// Where the rules are written. `-` selects standard output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputTarget {
    #[default]
    Stdout,
    File(PathBuf),
}

impl FromStr for OutputTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err("output path cannot be empty".to_string()),
            "-" => Ok(OutputTarget::Stdout),
            path => Ok(OutputTarget::File(PathBuf::from(path))),
        }
    }
}

impl OutputTarget {
    /// Write `content` to the destination, creating or truncating a file target.
    pub fn write(&self, content: &[u8]) -> Result<()> {
        match self {
            OutputTarget::Stdout => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                lock.write_all(content).context("writing to stdout")?;
                lock.flush().context("writing to stdout")?;
            }
            OutputTarget::File(path) => {
                let mut file = fs::File::create(path)
                    .with_context(|| format!("creating output {}", path.display()))?;
                file.write_all(content)
                    .with_context(|| format!("writing output {}", path.display()))?;
                tracing::debug!("wrote {} bytes to {}", content.len(), path.display());
            }
        }
        Ok(())
    }
}
