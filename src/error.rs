//! Error type for vault-relink operations

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by the relink core and the CLI around it.
///
/// Per-document failures are caught by the runner and recorded in the run
/// log; only configuration problems and a missing root escape a run.
#[derive(Debug, Error)]
pub enum RelinkError {
    /// Read, write or permission failure on a specific path
    #[error("{}: {source}", crate::util::display_path(.path))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configured tree root does not exist or is not a directory
    #[error("root directory not found: {}", crate::util::display_path(.0))]
    RootNotFound(PathBuf),

    /// Config file could not be read or parsed
    #[error("invalid config file {}: {message}", crate::util::display_path(.path))]
    Config { path: PathBuf, message: String },

    /// A setting has a value the pipeline cannot use
    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    /// The link audit found targets that do not exist
    #[error("found {0} broken link(s)")]
    BrokenLinks(usize),

    /// `--json` output could not be encoded
    #[error("failed to encode JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

impl RelinkError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        RelinkError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RelinkError>;
