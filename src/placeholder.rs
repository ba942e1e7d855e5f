//! Placeholder documents for dangling links

use std::fs;
use std::io;
use std::path::Path;

/// Make sure a file exists at `path`.
///
/// Returns `Ok(true)` when an empty file (and any missing parent directories)
/// was created, `Ok(false)` when something already existed there.
pub fn ensure(path: &Path) -> io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, "")?;
    Ok(true)
}
