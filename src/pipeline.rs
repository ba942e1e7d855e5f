//! Document transform pipeline
//!
//! Five text transforms applied to every document, in this order:
//! 1. Normalize existing bracket links (decode `%20`, strip directories)
//! 2. Convert `[[wiki links]]` to bracket links
//! 3. Resolve link targets to relative paths, creating placeholders
//! 4. Percent-encode spaces in link targets
//! 5. Strip the leading `---` metadata block
//!
//! Every stage takes the full document text and returns the rewritten text.
//! Stages never fail on their input; what they change is reported to an
//! [`EventSink`].

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants as C;
use crate::events::{Event, EventSink};
use crate::links::{self, BracketLink};
use crate::placeholder;
use crate::resolver::FileLocator;
use crate::util;

/// One pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Normalize,
    WikiLinks,
    Resolve,
    Encode,
    StripMetadata,
}

impl Stage {
    /// All stages in canonical order
    pub const ALL: [Stage; 5] = [
        Stage::Normalize,
        Stage::WikiLinks,
        Stage::Resolve,
        Stage::Encode,
        Stage::StripMetadata,
    ];

    /// 1-based position in the canonical order
    pub fn number(self) -> usize {
        match self {
            Stage::Normalize => 1,
            Stage::WikiLinks => 2,
            Stage::Resolve => 3,
            Stage::Encode => 4,
            Stage::StripMetadata => 5,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::Normalize => "Preprocessing Markdown Links",
            Stage::WikiLinks => "Converting Wiki Links",
            Stage::Resolve => "Updating Link Paths",
            Stage::Encode => "Encoding Spaces",
            Stage::StripMetadata => "Removing Metadata",
        }
    }

    /// Apply this stage to one document's text
    pub fn apply(self, text: &str, ctx: &StageContext<'_>, sink: &mut dyn EventSink) -> String {
        match self {
            Stage::Normalize => normalize_links(text, sink),
            Stage::WikiLinks => convert_wiki_links(text, sink),
            Stage::Resolve => resolve_links(text, ctx, sink),
            Stage::Encode => encode_spaces(text, sink),
            Stage::StripMetadata => strip_metadata(text, sink),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// What the resolve stage needs to know about the document being rewritten
pub struct StageContext<'a> {
    /// Directory containing the document (link targets are made relative to it)
    pub doc_dir: &'a Path,
    /// Locates bare file names under the tree root
    pub locator: &'a dyn FileLocator,
    /// Folder receiving placeholders for unresolved links
    pub new_files_dir: &'a Path,
}

/// Stage 1: decode `%20` and reduce local link targets to their file name
pub fn normalize_links(text: &str, sink: &mut dyn EventSink) -> String {
    let decoded = text.replace(C::ENCODED_SPACE, " ");

    links::replace_bracket_links(&decoded, |link| {
        if links::is_external(link.target) {
            return link.with_target(link.target);
        }
        let name = links::file_name(link.target);
        record_change(sink, link, name);
        link.with_target(name)
    })
}

/// Stage 2: `[[C]]` becomes `[C](C)` for known file suffixes, else `[C](C.md)`
pub fn convert_wiki_links(text: &str, sink: &mut dyn EventSink) -> String {
    links::replace_wiki_links(text, |link| {
        let content = link.content;
        let lowered = content.to_lowercase();
        let replacement = if C::KNOWN_TARGET_SUFFIXES
            .iter()
            .any(|suffix| lowered.ends_with(suffix))
        {
            format!("[{}]({})", content, content)
        } else {
            format!("[{}]({}{})", content, content, C::MARKDOWN_SUFFIX)
        };

        sink.record(Event::WikiLinkConverted {
            from: format!("[[{}]]", content),
            to: replacement.clone(),
        });
        replacement
    })
}

/// Stage 3: rewrite local link targets as paths relative to the document.
///
/// Unresolved non-image targets get an empty placeholder in the new-files
/// folder; unresolved image targets are kept as they are.
pub fn resolve_links(text: &str, ctx: &StageContext<'_>, sink: &mut dyn EventSink) -> String {
    links::replace_bracket_links(text, |link| {
        if links::is_external(link.target) {
            sink.record(Event::ExternalLink(link.target.to_string()));
            return link.with_target(link.target);
        }

        let name = links::file_name(link.target);
        let destination = match ctx.locator.locate(name) {
            Some(found) => found,
            None if link.image => {
                sink.record(Event::ImageKept(link.target.to_string()));
                return link.with_target(link.target);
            }
            None => {
                let placeholder_path = ctx.new_files_dir.join(name);
                match placeholder::ensure(&placeholder_path) {
                    Ok(true) => sink.record(Event::FileCreated(placeholder_path.clone())),
                    Ok(false) => sink.record(Event::FileExists(placeholder_path.clone())),
                    Err(e) => sink.record(Event::Error {
                        path: placeholder_path.clone(),
                        message: format!("failed to create placeholder: {}", e),
                    }),
                }
                placeholder_path
            }
        };

        let relative = util::display_path(&util::relative_path(ctx.doc_dir, &destination));
        record_change(sink, link, &relative);
        link.with_target(&relative)
    })
}

/// Stage 4: percent-encode spaces in link targets (labels untouched)
pub fn encode_spaces(text: &str, sink: &mut dyn EventSink) -> String {
    links::replace_bracket_links(text, |link| {
        let encoded = link.target.replace(' ', C::ENCODED_SPACE);
        record_change(sink, link, &encoded);
        link.with_target(&encoded)
    })
}

/// Stage 5: remove a leading metadata block.
///
/// The first line must be the delimiter and a closing delimiter must appear
/// within the first [`C::METADATA_WINDOW`] lines; the block, delimiters
/// included, is dropped. Anything else is returned unchanged.
pub fn strip_metadata(text: &str, sink: &mut dyn EventSink) -> String {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let is_delimiter = |line: &str| line.trim() == C::METADATA_DELIMITER;

    if !lines.first().map_or(false, |first| is_delimiter(first)) {
        return text.to_string();
    }

    let closing = lines
        .iter()
        .take(C::METADATA_WINDOW)
        .skip(1)
        .position(|line| is_delimiter(line));

    match closing {
        Some(offset) => {
            let removed = offset + 2;
            sink.record(Event::MetadataStripped { lines: removed });
            lines[removed..].concat()
        }
        None => text.to_string(),
    }
}

fn record_change(sink: &mut dyn EventSink, link: &BracketLink<'_>, new_target: &str) {
    if link.target != new_target {
        sink.record(Event::LinkChanged {
            from: link.with_target(link.target),
            to: link.with_target(new_target),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct FixedLocator(HashMap<String, PathBuf>);

    impl FixedLocator {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(name, path)| (name.to_string(), PathBuf::from(path)))
                    .collect(),
            )
        }
    }

    impl FileLocator for FixedLocator {
        fn locate(&self, name: &str) -> Option<PathBuf> {
            self.0.get(name).cloned()
        }
    }

    fn run(stage: Stage, text: &str) -> String {
        let locator = FixedLocator::new(&[]);
        let ctx = StageContext {
            doc_dir: Path::new("/vault"),
            locator: &locator,
            new_files_dir: Path::new("/vault/newnoteflow"),
        };
        stage.apply(text, &ctx, &mut Vec::new())
    }

    // === Stage 1 ===

    #[test]
    fn test_normalize_strips_directories() {
        let out = run(Stage::Normalize, "See [Plan](../projects/Plan.md) now");
        assert_eq!(out, "See [Plan](Plan.md) now");
    }

    #[test]
    fn test_normalize_decodes_spaces() {
        let out = run(Stage::Normalize, "[Plan](sub/Project%20Plan.md) 100%20");
        assert_eq!(out, "[Plan](Project Plan.md) 100 ");
        assert!(!out.contains("%20"));
    }

    #[test]
    fn test_normalize_keeps_external_links() {
        let text = "[site](https://example.com/a/b) [nb](onenote:///x/y) [h](http://h/p)";
        assert_eq!(run(Stage::Normalize, text), text);
    }

    #[test]
    fn test_normalize_keeps_image_marker() {
        let out = run(Stage::Normalize, "![shot](assets\\img\\shot.png)");
        assert_eq!(out, "![shot](shot.png)");
    }

    #[test]
    fn test_normalize_records_only_changes() {
        let mut events = Vec::new();
        normalize_links("[a](a.md) [b](x/b.md)", &mut events);
        assert_eq!(
            events,
            vec![Event::LinkChanged {
                from: "[b](x/b.md)".to_string(),
                to: "[b](b.md)".to_string(),
            }]
        );
    }

    // === Stage 2 ===

    #[test]
    fn test_wiki_link_gets_markdown_extension() {
        assert_eq!(
            run(Stage::WikiLinks, "[[Project Plan]]"),
            "[Project Plan](Project Plan.md)"
        );
    }

    #[test]
    fn test_wiki_link_with_known_suffix() {
        assert_eq!(run(Stage::WikiLinks, "[[diagram.PNG]]"), "[diagram.PNG](diagram.PNG)");
        assert_eq!(run(Stage::WikiLinks, "[[Note.md]]"), "[Note.md](Note.md)");
        assert_eq!(run(Stage::WikiLinks, "[[logo.svg]]"), "[logo.svg](logo.svg)");
    }

    #[test]
    fn test_wiki_link_conversion_is_idempotent() {
        let once = run(Stage::WikiLinks, "a [[X]] b [[y.jpeg]] c");
        let twice = run(Stage::WikiLinks, &once);
        assert_eq!(once, "a [X](X.md) b [y.jpeg](y.jpeg) c");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_wiki_link_events() {
        let mut events = Vec::new();
        convert_wiki_links("[[A]]", &mut events);
        assert_eq!(
            events,
            vec![Event::WikiLinkConverted {
                from: "[[A]]".to_string(),
                to: "[A](A.md)".to_string(),
            }]
        );
    }

    // === Stage 3 ===

    #[test]
    fn test_resolve_to_relative_path() {
        let locator = FixedLocator::new(&[("Project Plan.md", "/vault/sub/Project Plan.md")]);
        let ctx = StageContext {
            doc_dir: Path::new("/vault/other"),
            locator: &locator,
            new_files_dir: Path::new("/vault/newnoteflow"),
        };
        let out = resolve_links("[Plan](Project Plan.md)", &ctx, &mut Vec::new());
        assert_eq!(out, "[Plan](../sub/Project Plan.md)");
    }

    #[test]
    fn test_resolve_uses_file_name_of_target() {
        let locator = FixedLocator::new(&[("Note.md", "/vault/a/Note.md")]);
        let ctx = StageContext {
            doc_dir: Path::new("/vault"),
            locator: &locator,
            new_files_dir: Path::new("/vault/newnoteflow"),
        };
        let out = resolve_links("[n](/old/export/Note.md)", &ctx, &mut Vec::new());
        assert_eq!(out, "[n](a/Note.md)");
    }

    #[test]
    fn test_resolve_creates_placeholder() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let new_files = root.join("newnoteflow");
        let doc_dir = root.join("notes");
        fs::create_dir_all(&doc_dir).unwrap();

        let locator = FixedLocator::new(&[]);
        let ctx = StageContext {
            doc_dir: &doc_dir,
            locator: &locator,
            new_files_dir: &new_files,
        };
        let mut events = Vec::new();
        let out = resolve_links("[Missing](Missing.md)", &ctx, &mut events);

        assert_eq!(out, "[Missing](../newnoteflow/Missing.md)");
        assert!(new_files.join("Missing.md").is_file());
        assert!(events.contains(&Event::FileCreated(new_files.join("Missing.md"))));

        // A second link to the same target reuses the placeholder
        let mut events = Vec::new();
        resolve_links("[Missing](Missing.md)", &ctx, &mut events);
        assert!(events.contains(&Event::FileExists(new_files.join("Missing.md"))));
    }

    #[test]
    fn test_resolve_keeps_missing_image() {
        let temp_dir = TempDir::new().unwrap();
        let new_files = temp_dir.path().join("newnoteflow");
        let locator = FixedLocator::new(&[]);
        let ctx = StageContext {
            doc_dir: temp_dir.path(),
            locator: &locator,
            new_files_dir: &new_files,
        };
        let mut events = Vec::new();
        let out = resolve_links("![pic](pic.png)", &ctx, &mut events);

        assert_eq!(out, "![pic](pic.png)");
        assert!(!new_files.exists());
        assert_eq!(events, vec![Event::ImageKept("pic.png".to_string())]);
    }

    #[test]
    fn test_resolve_found_image() {
        let locator = FixedLocator::new(&[("pic.png", "/vault/assets/pic.png")]);
        let ctx = StageContext {
            doc_dir: Path::new("/vault/notes"),
            locator: &locator,
            new_files_dir: Path::new("/vault/newnoteflow"),
        };
        let out = resolve_links("![pic](pic.png)", &ctx, &mut Vec::new());
        assert_eq!(out, "![pic](../assets/pic.png)");
    }

    #[test]
    fn test_resolve_leaves_external_links() {
        let text = "[site](https://example.com/Note.md)";
        assert_eq!(run(Stage::Resolve, text), text);
    }

    // === Stage 4 ===

    #[test]
    fn test_encode_spaces_in_targets_only() {
        let out = run(Stage::Encode, "[Project Plan](sub/Project Plan.md)");
        assert_eq!(out, "[Project Plan](sub/Project%20Plan.md)");
    }

    #[test]
    fn test_encode_is_idempotent() {
        let once = run(Stage::Encode, "[a b](c d/e f.md) ![x y](z w.png)");
        let twice = run(Stage::Encode, &once);
        assert_eq!(once, twice);
        assert!(!twice.contains("%20%20"));
    }

    // === Stage 5 ===

    #[test]
    fn test_strip_metadata_block() {
        let out = run(Stage::StripMetadata, "---\ntag: x\n---\nBody text");
        assert_eq!(out, "Body text");
    }

    #[test]
    fn test_strip_metadata_crlf() {
        let out = run(Stage::StripMetadata, "---\r\ntag: x\r\n---\r\nBody\r\n");
        assert_eq!(out, "Body\r\n");
    }

    #[test]
    fn test_strip_metadata_requires_leading_delimiter() {
        let text = "Title\n---\ntag: x\n---\nBody";
        assert_eq!(run(Stage::StripMetadata, text), text);
    }

    #[test]
    fn test_strip_metadata_requires_closing_within_window() {
        let mut text = String::from("---\n");
        for i in 0..8 {
            text.push_str(&format!("key{}: v\n", i));
        }
        text.push_str("---\nBody");
        assert_eq!(run(Stage::StripMetadata, &text), text);
    }

    #[test]
    fn test_strip_metadata_closing_on_ninth_line() {
        let mut text = String::from("---\n");
        for i in 0..7 {
            text.push_str(&format!("key{}: v\n", i));
        }
        text.push_str("---\nBody");
        let mut events = Vec::new();
        assert_eq!(strip_metadata(&text, &mut events), "Body");
        assert_eq!(events, vec![Event::MetadataStripped { lines: 9 }]);
    }

    #[test]
    fn test_strip_metadata_without_block() {
        let text = "# Heading\n\nNo metadata here\n";
        assert_eq!(run(Stage::StripMetadata, text), text);
        assert_eq!(run(Stage::StripMetadata, ""), "");
    }

    // === Pipeline ===

    #[test]
    fn test_stage_order_and_numbers() {
        let numbers: Vec<_> = Stage::ALL.iter().map(|s| s.number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        let mut sorted = Stage::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, Stage::ALL.to_vec());
    }

    #[test]
    fn test_wiki_link_end_to_end() {
        let locator = FixedLocator::new(&[("Project Plan.md", "/vault/sub/Project Plan.md")]);
        let ctx = StageContext {
            doc_dir: Path::new("/vault"),
            locator: &locator,
            new_files_dir: Path::new("/vault/newnoteflow"),
        };
        let mut text = String::from("---\ntag: x\n---\nSee [[Project Plan]].");
        for stage in Stage::ALL {
            text = stage.apply(&text, &ctx, &mut Vec::new());
        }
        assert_eq!(text, "See [Project Plan](sub/Project%20Plan.md).");
    }
}
