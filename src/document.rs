//! Document loading and atomic replacement

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{RelinkError, Result};

/// A Markdown document held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: PathBuf,
    pub text: String,
}

impl Document {
    /// Read a UTF-8 document into an owned buffer
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = fs::read_to_string(&path).map_err(|e| RelinkError::io(&path, e))?;
        Ok(Self { path, text })
    }

    /// Directory containing the document
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Replace the document on disk with `self.text`.
    ///
    /// Writes to a temporary file next to the document and renames it over
    /// the original, so an interrupted save never leaves a half-written file.
    pub fn save(&self) -> Result<()> {
        let io_err = |e: std::io::Error| RelinkError::io(&self.path, e);

        let mut temp = NamedTempFile::new_in(self.dir()).map_err(io_err)?;
        temp.write_all(self.text.as_bytes()).map_err(io_err)?;
        temp.as_file().sync_all().map_err(io_err)?;

        // Keep the original permissions on the replacement
        if let Ok(metadata) = fs::metadata(&self.path) {
            fs::set_permissions(temp.path(), metadata.permissions()).map_err(io_err)?;
        }

        temp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}
