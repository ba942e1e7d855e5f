//! Directory index documents
//!
//! Each directory gets a `<name>.md` landing page listing its documents and
//! the index documents of its subdirectories. Existing index documents are
//! never touched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::constants as C;
use crate::util;

/// Result of [`build_index`]
#[derive(Debug, Clone, PartialEq)]
pub enum IndexOutcome {
    /// A new index was written at this path
    Created(PathBuf),
    /// An index already existed at this path
    Exists(PathBuf),
}

/// Path of the index document for `dir`: `<dir>/<dir name>.md`
pub fn index_path(dir: &Path) -> PathBuf {
    let name = util::file_name_lossy(dir);
    dir.join(format!("{}{}", name, C::MARKDOWN_SUFFIX))
}

/// Create the index document for `dir` unless one already exists.
///
/// Entries are sorted by name; links are absolute, to be rewritten by the
/// resolve stage like any other link. With `skip_hidden`, children whose
/// names start with `.` are left out.
pub fn build_index(dir: &Path, skip_hidden: bool) -> io::Result<IndexOutcome> {
    let index = index_path(dir);
    if index.exists() {
        return Ok(IndexOutcome::Exists(index));
    }

    let absolute_dir = dunce::canonicalize(dir)?;
    let index_name = util::file_name_lossy(&index);

    let mut children: Vec<(String, bool)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        if skip_hidden && util::is_hidden(&file_name) {
            continue;
        }
        let is_dir = entry.file_type()?.is_dir();
        children.push((file_name.to_string_lossy().into_owned(), is_dir));
    }
    children.sort();

    let mut lines = Vec::new();
    for (name, is_dir) in children {
        let child = absolute_dir.join(&name);
        if is_dir {
            let child_index = child.join(format!("{}{}", name, C::MARKDOWN_SUFFIX));
            lines.push(format!("- [{}]({})", name, util::display_path(&child_index)));
        } else if util::is_markdown(&child) && name != index_name {
            let label = child
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| name.clone());
            lines.push(format!("- [{}]({})", label, util::display_path(&child)));
        }
    }

    fs::write(&index, lines.join(C::NEWLINE))?;
    Ok(IndexOutcome::Created(index))
}
