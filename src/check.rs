//! Link audit
//!
//! Parses every document with pulldown-cmark and reports local link and
//! image targets that do not exist relative to the document's directory.
//! Meant to be run after a relink pass; targets must be valid CommonMark
//! destinations (spaces percent-encoded) to be seen at all.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pulldown_cmark::{Event, Parser, Tag};
use serde::Serialize;
use walkdir::WalkDir;

use crate::constants as C;
use crate::links;
use crate::util;

/// A link whose target is missing on disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokenLink {
    /// Document containing the link, relative to the scan root
    pub source: PathBuf,
    /// 1-based line of the link
    pub line: usize,
    /// Target as written in the document
    pub target: String,
    pub image: bool,
}

/// Result of auditing a tree
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckReport {
    pub documents: usize,
    pub links: usize,
    pub broken: Vec<BrokenLink>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.broken.is_empty()
    }
}

/// A local link found in a document
#[derive(Debug, Clone, PartialEq)]
struct LocalLink {
    line: usize,
    target: String,
    image: bool,
}

/// Audit every Markdown document under `root`.
///
/// Only an unreadable root fails the audit; unreadable entries below it are
/// logged and skipped.
pub fn check_tree(root: &Path, skip_hidden: bool) -> io::Result<CheckReport> {
    let mut report = CheckReport::default();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !skip_hidden || !util::is_hidden(entry.file_name())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(io::Error::from(e)),
            Err(e) => {
                let path = e.path().map(util::display_path).unwrap_or_default();
                tracing::warn!(path = %path, "skipping unreadable entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !util::is_markdown(path) {
            continue;
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %util::display_path(path), "skipping unreadable document: {}", e);
                continue;
            }
        };

        report.documents += 1;
        let doc_dir = path.parent().unwrap_or(root);
        let source = path.strip_prefix(root).unwrap_or(path).to_path_buf();

        for link in local_links(&content) {
            report.links += 1;
            if !target_exists(doc_dir, &link.target) {
                report.broken.push(BrokenLink {
                    source: source.clone(),
                    line: link.line,
                    target: link.target,
                    image: link.image,
                });
            }
        }
    }

    Ok(report)
}

/// Extract local link and image destinations with their line numbers
fn local_links(content: &str) -> Vec<LocalLink> {
    let mut found = Vec::new();

    for (event, range) in Parser::new(content).into_offset_iter() {
        let (dest, image) = match event {
            Event::Start(Tag::Link { dest_url, .. }) => (dest_url, false),
            Event::Start(Tag::Image { dest_url, .. }) => (dest_url, true),
            _ => continue,
        };

        let dest = dest.to_string();
        if !is_local(&dest) {
            continue;
        }

        let line = content[..range.start].matches('\n').count() + 1;
        found.push(LocalLink {
            line,
            target: dest,
            image,
        });
    }

    found
}

fn is_local(dest: &str) -> bool {
    !dest.is_empty()
        && !links::is_external(dest)
        && !dest.contains("://")
        && !dest.starts_with("mailto:")
        && !dest.starts_with('#')
}

fn target_exists(doc_dir: &Path, target: &str) -> bool {
    let without_fragment = target.split('#').next().unwrap_or(target);
    let decoded = without_fragment.replace(C::ENCODED_SPACE, " ");
    doc_dir.join(decoded).exists()
}
