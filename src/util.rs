//! Utility functions for path handling shared by the pipeline and the runner

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::constants as C;

/// Compute the path of `target` relative to the directory `from_dir`.
///
/// Both paths are expected to be in the same form (both absolute, or both
/// relative to the same base). Walks up with `..` past the common prefix.
pub fn relative_path(from_dir: &Path, target: &Path) -> PathBuf {
    let from: Vec<Component> = from_dir
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let to: Vec<Component> = target
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..from.len() {
        result.push("..");
    }
    for component in &to[common..] {
        result.push(component.as_os_str());
    }

    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}

/// Display a path with forward slashes (cross-platform standard)
/// Converts Windows backslashes to forward slashes for consistent output
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

/// Hidden entries (`.obsidian`, `.git`, `.trash`) are never walked or indexed
pub fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Check whether a path names a Markdown document
pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == C::MARKDOWN_EXTENSION)
        .unwrap_or(false)
}

/// File name of a path as a lossy string (empty for paths like `/`)
pub fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
