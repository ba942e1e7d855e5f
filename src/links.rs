//! Link pattern matching
//!
//! Finds the two link notations the pipeline rewrites:
//! - Double-bracket links: `[[content]]`
//! - Bracket links: `[label](target)`, optionally prefixed with `!` for images
//!
//! Matching is purely lexical. There is no nesting support and malformed
//! links are simply not matched; leftmost match wins.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::constants as C;

static WIKI_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("wiki link pattern is valid"));

static BRACKET_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(!?)\[([^\]]+)\]\(([^)]+)\)").expect("bracket link pattern is valid")
});

/// A `[[content]]` occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct WikiLink<'a> {
    /// Byte range of the whole match
    pub span: Range<usize>,
    /// Text between the brackets, verbatim
    pub content: &'a str,
}

/// A `[label](target)` or `![label](target)` occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct BracketLink<'a> {
    /// Byte range of the whole match, including the image marker
    pub span: Range<usize>,
    /// Whether the link carries the `!` image marker
    pub image: bool,
    pub label: &'a str,
    pub target: &'a str,
}

impl BracketLink<'_> {
    /// Render the link back to source form with a different target
    pub fn with_target(&self, target: &str) -> String {
        format!("{}[{}]({})", self.marker(), self.label, target)
    }

    /// `"!"` for image links, empty otherwise
    pub fn marker(&self) -> &'static str {
        if self.image {
            "!"
        } else {
            ""
        }
    }
}

impl<'a> WikiLink<'a> {
    fn from_captures(caps: &Captures<'a>) -> Self {
        let whole = caps.get(0).expect("group 0 always participates");
        WikiLink {
            span: whole.range(),
            content: caps.get(1).map_or("", |m| m.as_str()),
        }
    }
}

impl<'a> BracketLink<'a> {
    fn from_captures(caps: &Captures<'a>) -> Self {
        let whole = caps.get(0).expect("group 0 always participates");
        BracketLink {
            span: whole.range(),
            image: caps.get(1).map_or(false, |m| !m.as_str().is_empty()),
            label: caps.get(2).map_or("", |m| m.as_str()),
            target: caps.get(3).map_or("", |m| m.as_str()),
        }
    }
}

/// Iterate over double-bracket links in document order
pub fn wiki_links(text: &str) -> impl Iterator<Item = WikiLink<'_>> {
    WIKI_LINK_RE
        .captures_iter(text)
        .map(|caps| WikiLink::from_captures(&caps))
}

/// Iterate over bracket links (image and plain) in document order
pub fn bracket_links(text: &str) -> impl Iterator<Item = BracketLink<'_>> {
    BRACKET_LINK_RE
        .captures_iter(text)
        .map(|caps| BracketLink::from_captures(&caps))
}

/// Rewrite every double-bracket link with `f`; unmatched text is copied as is
pub fn replace_wiki_links<F>(text: &str, mut f: F) -> String
where
    F: FnMut(&WikiLink<'_>) -> String,
{
    WIKI_LINK_RE
        .replace_all(text, |caps: &Captures<'_>| f(&WikiLink::from_captures(caps)))
        .into_owned()
}

/// Rewrite every bracket link with `f`; unmatched text is copied as is
pub fn replace_bracket_links<F>(text: &str, mut f: F) -> String
where
    F: FnMut(&BracketLink<'_>) -> String,
{
    BRACKET_LINK_RE
        .replace_all(text, |caps: &Captures<'_>| f(&BracketLink::from_captures(caps)))
        .into_owned()
}

/// Whether a link target points outside the document tree
pub fn is_external(target: &str) -> bool {
    C::EXTERNAL_SCHEMES
        .iter()
        .any(|scheme| target.starts_with(scheme))
}

/// Last path component of a link target, accepting `/` and `\` separators
pub fn file_name(target: &str) -> &str {
    target
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(target)
}
