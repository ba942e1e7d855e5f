//! Path resolution
//!
//! Resolves a bare file name to a concrete file under the tree root.
//!
//! Walk order is deterministic: inside each directory, files come before
//! subdirectories and both are sorted by name, then the walk descends
//! top-down. The first file whose name matches exactly wins, so a file in a
//! directory shadows same-named files anywhere below it, and sibling
//! subtrees are searched in name order. Every entry is searched, hidden
//! directories included.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Capability to locate a document by file name
pub trait FileLocator {
    /// Return the first file named exactly `name`, or `None`
    fn locate(&self, name: &str) -> Option<PathBuf>;
}

/// Locator that re-walks the tree under `root` on every call
#[derive(Debug, Clone)]
pub struct TreeLocator {
    root: PathBuf,
}

impl TreeLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileLocator for TreeLocator {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }

        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by(files_first_by_name)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .find(|entry| entry.file_type().is_file() && entry.file_name() == name)
            .map(DirEntry::into_path)
    }
}

fn files_first_by_name(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}
