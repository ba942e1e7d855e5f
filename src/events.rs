//! Run events and the Markdown run log
//!
//! The core never formats output itself: stages and the runner report what
//! they do as [`Event`]s to an [`EventSink`]. [`MarkdownLog`] renders them as
//! a human-readable log file; tests collect them in a `Vec<Event>`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::constants as C;
use crate::pipeline::Stage;
use crate::runner::RunStats;
use crate::util;

/// Something that happened during a run
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RunStarted { root: PathBuf, at: DateTime<Local> },
    StageSkipped(Stage),
    StageStarted(Stage),
    DirectoryEntered { dir: PathBuf, documents: usize },
    DocumentStarted(PathBuf),
    DocumentDone { path: PathBuf, stage: Stage },
    /// A bracket-link target was rewritten
    LinkChanged { from: String, to: String },
    /// A double-bracket link was converted to a bracket link
    WikiLinkConverted { from: String, to: String },
    ExternalLink(String),
    /// An image link with no matching file was left as is
    ImageKept(String),
    MetadataStripped { lines: usize },
    FileCreated(PathBuf),
    FileExists(PathBuf),
    IndexCreated(PathBuf),
    IndexExists(PathBuf),
    Error { path: PathBuf, message: String },
    StageCompleted { stage: Stage, documents: usize },
    RunFinished { stats: RunStats, at: DateTime<Local> },
}

/// Receiver for run events
pub trait EventSink {
    fn record(&mut self, event: Event);
}

impl EventSink for Vec<Event> {
    fn record(&mut self, event: Event) {
        self.push(event);
    }
}

/// Mirror an event to `tracing`
pub fn trace(event: &Event) {
    match event {
        Event::Error { path, message } => {
            tracing::warn!(path = %util::display_path(path), "{}", message);
        }
        Event::StageStarted(stage) => {
            tracing::info!(stage = stage.number(), "{}", stage.title());
        }
        Event::StageSkipped(stage) => {
            tracing::info!(stage = stage.number(), "skipping {}", stage.title());
        }
        Event::RunFinished { stats, .. } => {
            tracing::info!(
                files = stats.files_processed,
                indexed = stats.directories_indexed,
                errors = stats.errors,
                "run finished"
            );
        }
        other => tracing::debug!(event = ?other),
    }
}

/// Writes events as a Markdown document
pub struct MarkdownLog<W: Write> {
    out: W,
}

impl MarkdownLog<BufWriter<File>> {
    /// Create (truncate) a log file at `path`
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> MarkdownLog<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn write_event(&mut self, event: &Event) -> io::Result<()> {
        let out = &mut self.out;
        match event {
            Event::RunStarted { root, at } => {
                writeln!(out, "# Vault Relink Log")?;
                writeln!(out)?;
                writeln!(out, "## Started: {}", at.format(C::LOG_TIMESTAMP_FORMAT))?;
                writeln!(out, "Root: `{}`", util::display_path(root))?;
            }
            Event::StageSkipped(stage) => {
                writeln!(out)?;
                writeln!(out, "Skipped stage {}: {}", stage.number(), stage.title())?;
            }
            Event::StageStarted(stage) => {
                writeln!(out)?;
                writeln!(out, "## Stage {}: {}", stage.number(), stage.title())?;
            }
            Event::DirectoryEntered { dir, documents } => {
                writeln!(out)?;
                writeln!(out, "### Directory: {}", util::file_name_lossy(dir))?;
                if *documents > 0 {
                    writeln!(out, "Found {} Markdown files", documents)?;
                }
            }
            Event::DocumentStarted(path) => {
                writeln!(out, "- Processing: `{}`", util::file_name_lossy(path))?;
            }
            Event::DocumentDone { path, stage } => {
                writeln!(
                    out,
                    "  - Done ({}): `{}`",
                    stage.title(),
                    util::file_name_lossy(path)
                )?;
            }
            Event::LinkChanged { from, to } | Event::WikiLinkConverted { from, to } => {
                writeln!(out, "  - Changed: `{}` -> `{}`", from, to)?;
            }
            Event::ExternalLink(target) => {
                writeln!(out, "  - External link: `{}`", target)?;
            }
            Event::ImageKept(target) => {
                writeln!(out, "  - Keeping image link: `{}`", target)?;
            }
            Event::MetadataStripped { lines } => {
                writeln!(out, "  - Removed {} metadata lines", lines)?;
            }
            Event::FileCreated(path) => {
                writeln!(out, "- Created new file: `{}`", util::file_name_lossy(path))?;
            }
            Event::FileExists(path) => {
                writeln!(out, "- File exists: `{}`", util::file_name_lossy(path))?;
            }
            Event::IndexCreated(dir) => {
                writeln!(out, "- Created index for `{}`", util::file_name_lossy(dir))?;
            }
            Event::IndexExists(dir) => {
                writeln!(out, "- Index exists: `{}`", util::file_name_lossy(dir))?;
            }
            Event::Error { path, message } => {
                writeln!(out, "**ERROR**: `{}`: {}", util::display_path(path), message)?;
            }
            Event::StageCompleted { stage, documents } => {
                writeln!(out)?;
                writeln!(
                    out,
                    "Completed stage {}: {} files processed",
                    stage.number(),
                    documents
                )?;
            }
            Event::RunFinished { stats, at } => {
                writeln!(out)?;
                writeln!(out, "## Summary")?;
                writeln!(out, "- Total files processed: {}", stats.files_processed)?;
                writeln!(out, "- Wiki links converted: {}", stats.wiki_links_converted)?;
                writeln!(out, "- Links rewritten: {}", stats.links_rewritten)?;
                writeln!(out, "- Placeholders created: {}", stats.placeholders_created)?;
                writeln!(out, "- Directories indexed: {}", stats.directories_indexed)?;
                writeln!(out, "- Errors encountered: {}", stats.errors)?;
                writeln!(out)?;
                writeln!(out, "Completed at: {}", at.format(C::LOG_TIMESTAMP_FORMAT))?;
            }
        }
        Ok(())
    }
}

impl<W: Write> EventSink for MarkdownLog<W> {
    fn record(&mut self, event: Event) {
        if let Err(e) = self.write_event(&event) {
            tracing::warn!("failed to write run log: {}", e);
        }
    }
}
