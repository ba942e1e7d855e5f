//! Run orchestration
//!
//! Walks the document tree once per selected stage, top-down with sorted
//! listings, and rewrites every Markdown document in place. During the
//! resolve stage each directory's subdirectories get an index document
//! before the directory's own documents are processed.
//!
//! A failing document is recorded and skipped; it never stops the run.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::config::Settings;
use crate::document::Document;
use crate::error::{RelinkError, Result};
use crate::events::{self, Event, EventSink};
use crate::indexer::{self, IndexOutcome};
use crate::pipeline::{Stage, StageContext};
use crate::resolver::TreeLocator;
use crate::util;

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub files_processed: usize,
    pub wiki_links_converted: usize,
    pub links_rewritten: usize,
    pub placeholders_created: usize,
    pub directories_indexed: usize,
    pub errors: usize,
}

/// Executes the selected stages over a document tree
#[derive(Debug, Clone)]
pub struct Runner {
    root: PathBuf,
    new_files_dir: PathBuf,
    stages: BTreeSet<Stage>,
    skip_hidden: bool,
    locator: TreeLocator,
}

impl Runner {
    /// Create a runner; fails if the configured root is not a directory
    pub fn new(settings: &Settings) -> Result<Self> {
        let root = settings.resolve_root()?;
        let new_files_dir = root.join(&settings.new_files_folder);
        Ok(Self {
            locator: TreeLocator::new(&root),
            root,
            new_files_dir,
            stages: settings.stages.clone(),
            skip_hidden: settings.skip_hidden,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run every selected stage in canonical order
    pub fn run(&self, sink: &mut dyn EventSink) -> RunStats {
        let mut rec = Recorder::new(sink);
        rec.record(Event::RunStarted {
            root: self.root.clone(),
            at: Local::now(),
        });

        for stage in Stage::ALL {
            if !self.stages.contains(&stage) {
                rec.record(Event::StageSkipped(stage));
                continue;
            }

            let _span = tracing::info_span!("stage", number = stage.number()).entered();
            rec.record(Event::StageStarted(stage));
            let documents = self.walk_stage(stage, &self.root, &mut rec);
            rec.record(Event::StageCompleted { stage, documents });
        }

        rec.finish()
    }

    /// Create missing index documents for every directory below the root
    pub fn index_tree(&self, sink: &mut dyn EventSink) -> RunStats {
        let mut rec = Recorder::new(sink);
        rec.record(Event::RunStarted {
            root: self.root.clone(),
            at: Local::now(),
        });
        self.walk_indexes(&self.root, &mut rec);
        rec.finish()
    }

    fn walk_stage(&self, stage: Stage, dir: &Path, rec: &mut Recorder<'_>) -> usize {
        let listing = match list_dir(dir, self.skip_hidden) {
            Ok(listing) => listing,
            Err(e) => {
                rec.record(Event::Error {
                    path: dir.to_path_buf(),
                    message: format!("failed to read directory: {}", e),
                });
                return 0;
            }
        };

        rec.record(Event::DirectoryEntered {
            dir: dir.to_path_buf(),
            documents: listing.documents.len(),
        });

        if stage == Stage::Resolve {
            for subdir in &listing.subdirs {
                self.index_directory(subdir, rec);
            }
        }

        let mut processed = 0;
        for path in &listing.documents {
            self.process_document(stage, path, rec);
            processed += 1;
        }

        for subdir in &listing.subdirs {
            processed += self.walk_stage(stage, subdir, rec);
        }
        processed
    }

    fn walk_indexes(&self, dir: &Path, rec: &mut Recorder<'_>) {
        let listing = match list_dir(dir, self.skip_hidden) {
            Ok(listing) => listing,
            Err(e) => {
                rec.record(Event::Error {
                    path: dir.to_path_buf(),
                    message: format!("failed to read directory: {}", e),
                });
                return;
            }
        };

        for subdir in &listing.subdirs {
            self.index_directory(subdir, rec);
            self.walk_indexes(subdir, rec);
        }
    }

    fn index_directory(&self, dir: &Path, rec: &mut Recorder<'_>) {
        match indexer::build_index(dir, self.skip_hidden) {
            Ok(IndexOutcome::Created(_)) => rec.record(Event::IndexCreated(dir.to_path_buf())),
            Ok(IndexOutcome::Exists(_)) => rec.record(Event::IndexExists(dir.to_path_buf())),
            Err(e) => rec.record(Event::Error {
                path: dir.to_path_buf(),
                message: format!("failed to create index: {}", e),
            }),
        }
    }

    fn process_document(&self, stage: Stage, path: &Path, rec: &mut Recorder<'_>) {
        rec.stats.files_processed += 1;
        rec.record(Event::DocumentStarted(path.to_path_buf()));

        match self.transform_document(stage, path, rec) {
            Ok(()) => rec.record(Event::DocumentDone {
                path: path.to_path_buf(),
                stage,
            }),
            Err(e) => rec.record(Event::Error {
                path: path.to_path_buf(),
                message: error_message(&e),
            }),
        }
    }

    fn transform_document(&self, stage: Stage, path: &Path, rec: &mut Recorder<'_>) -> Result<()> {
        let mut doc = Document::load(path)?;
        let text = {
            let ctx = StageContext {
                doc_dir: doc.dir(),
                locator: &self.locator,
                new_files_dir: &self.new_files_dir,
            };
            stage.apply(&doc.text, &ctx, rec)
        };
        doc.text = text;
        doc.save()
    }
}

/// Direct children of a directory that the walk cares about
struct Listing {
    subdirs: Vec<PathBuf>,
    documents: Vec<PathBuf>,
}

fn list_dir(dir: &Path, skip_hidden: bool) -> io::Result<Listing> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if skip_hidden && util::is_hidden(&entry.file_name()) {
            continue;
        }
        entries.push((entry.path(), entry.file_type()?));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut listing = Listing {
        subdirs: Vec::new(),
        documents: Vec::new(),
    };
    for (path, file_type) in entries {
        if file_type.is_dir() {
            listing.subdirs.push(path);
        } else if file_type.is_file() && util::is_markdown(&path) {
            listing.documents.push(path);
        }
    }
    Ok(listing)
}

fn error_message(err: &RelinkError) -> String {
    match err {
        RelinkError::Io { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

/// Forwards events to the caller's sink, mirrors them to tracing and
/// keeps the run counters
struct Recorder<'a> {
    inner: &'a mut dyn EventSink,
    stats: RunStats,
}

impl<'a> Recorder<'a> {
    fn new(inner: &'a mut dyn EventSink) -> Self {
        Self {
            inner,
            stats: RunStats::default(),
        }
    }

    fn finish(mut self) -> RunStats {
        let stats = self.stats.clone();
        self.record(Event::RunFinished {
            stats: stats.clone(),
            at: Local::now(),
        });
        stats
    }
}

impl EventSink for Recorder<'_> {
    fn record(&mut self, event: Event) {
        events::trace(&event);
        match &event {
            Event::WikiLinkConverted { .. } => self.stats.wiki_links_converted += 1,
            Event::LinkChanged { .. } => self.stats.links_rewritten += 1,
            Event::FileCreated(_) => self.stats.placeholders_created += 1,
            Event::IndexCreated(_) => self.stats.directories_indexed += 1,
            Event::Error { .. } => self.stats.errors += 1,
            _ => {}
        }
        self.inner.record(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn read(root: &Path, relative: &str) -> String {
        fs::read_to_string(root.join(relative)).unwrap()
    }

    fn settings_for(root: &Path, stages: &[Stage]) -> Settings {
        Settings {
            root: root.to_string_lossy().into_owned(),
            stages: stages.iter().copied().collect(),
            ..Settings::default()
        }
    }

    fn run_stages(root: &Path, stages: &[Stage]) -> (RunStats, Vec<Event>) {
        let runner = Runner::new(&settings_for(root, stages)).unwrap();
        let mut events = Vec::new();
        let stats = runner.run(&mut events);
        (stats, events)
    }

    #[test]
    fn test_full_run_resolves_wiki_link() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "Home.md", "See [[Project Plan]]");
        write(root, "sub/Project Plan.md", "plan");

        let (stats, _) = run_stages(root, &Stage::ALL);

        assert_eq!(read(root, "Home.md"), "See [Project Plan](sub/Project%20Plan.md)");
        assert_eq!(stats.wiki_links_converted, 1);
        assert_eq!(stats.errors, 0);
    }

    #[test]
    fn test_full_run_creates_placeholder_and_index() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "Home.md", "Todo: [[Missing Note]]");
        write(root, "sub/Project Plan.md", "plan");

        let (stats, _) = run_stages(root, &Stage::ALL);

        assert_eq!(
            read(root, "Home.md"),
            "Todo: [Missing Note](newnoteflow/Missing%20Note.md)"
        );
        assert!(root.join("newnoteflow/Missing Note.md").is_file());
        assert_eq!(stats.placeholders_created, 1);

        // The index is generated with absolute links, then rewritten by the
        // resolve and encode stages when its directory is walked
        assert_eq!(read(root, "sub/sub.md"), "- [Project Plan](Project%20Plan.md)");
        assert_eq!(stats.directories_indexed, 1);
    }

    #[test]
    fn test_links_between_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "a/Source.md", "[target](old/export/path/Target.md)");
        write(root, "b/Target.md", "");

        run_stages(root, &Stage::ALL);

        assert_eq!(read(root, "a/Source.md"), "[target](../b/Target.md)");
    }

    #[test]
    fn test_only_selected_stages_run() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "Note.md", "---\ntag: x\n---\n[[A]] and [b](x/b%20c.md)");

        let (_, events) = run_stages(root, &[Stage::WikiLinks]);

        assert_eq!(
            read(root, "Note.md"),
            "---\ntag: x\n---\n[A](A.md) and [b](x/b%20c.md)"
        );
        for stage in [Stage::Normalize, Stage::Resolve, Stage::Encode, Stage::StripMetadata] {
            assert!(events.contains(&Event::StageSkipped(stage)));
        }
        assert!(!root.join("newnoteflow").exists());
    }

    #[test]
    fn test_strip_metadata_stage() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "Note.md", "---\ntag: x\n---\nBody text");

        run_stages(root, &[Stage::StripMetadata]);

        assert_eq!(read(root, "Note.md"), "Body text");
    }

    #[test]
    fn test_failing_document_does_not_stop_run() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let bad = root.join("Bad.md");
        fs::write(&bad, [0xff, 0xfe, 0x00, 0x80]).unwrap();
        write(root, "Good.md", "[[Other]]");

        let (stats, events) = run_stages(root, &[Stage::WikiLinks]);

        assert_eq!(read(root, "Good.md"), "[Other](Other.md)");
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.files_processed, 2);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Error { path, .. } if path.ends_with("Bad.md"))));
        assert_eq!(fs::read(&bad).unwrap(), vec![0xff, 0xfe, 0x00, 0x80]);
    }

    #[test]
    fn test_link_resolves_into_hidden_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, ".attachments/Spec Sheet.md", "sheet");
        write(root, "Home.md", "[[Spec Sheet]]");

        let (stats, _) = run_stages(root, &Stage::ALL);

        assert_eq!(read(root, "Home.md"), "[Spec Sheet](.attachments/Spec%20Sheet.md)");
        assert!(!root.join("newnoteflow").exists());
        assert_eq!(stats.placeholders_created, 0);
        assert_eq!(read(root, ".attachments/Spec Sheet.md"), "sheet");
    }

    #[test]
    fn test_skip_hidden_leaves_hidden_documents_alone() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, ".obsidian/workspace.md", "[[Keep]]");
        write(root, ".attachments/Spec Sheet.md", "");
        write(root, "Home.md", "[[Spec Sheet]]");

        let settings = Settings {
            skip_hidden: true,
            ..settings_for(root, &Stage::ALL)
        };
        let mut events: Vec<Event> = Vec::new();
        Runner::new(&settings).unwrap().run(&mut events);

        assert_eq!(read(root, ".obsidian/workspace.md"), "[[Keep]]");
        assert!(!root.join(".obsidian/.obsidian.md").exists());
        assert_eq!(read(root, "Home.md"), "[Spec Sheet](.attachments/Spec%20Sheet.md)");
    }

    #[test]
    fn test_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let settings = settings_for(&temp_dir.path().join("nope"), &Stage::ALL);
        assert!(matches!(Runner::new(&settings), Err(RelinkError::RootNotFound(_))));
    }

    #[test]
    fn test_run_events_bracket_stages() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "Note.md", "");

        let (stats, events) = run_stages(root, &[Stage::Encode]);

        assert!(matches!(events.first(), Some(Event::RunStarted { .. })));
        assert!(matches!(events.last(), Some(Event::RunFinished { .. })));
        assert!(events.contains(&Event::StageCompleted {
            stage: Stage::Encode,
            documents: 1,
        }));
        assert_eq!(stats.files_processed, 1);
    }

    #[test]
    fn test_index_tree() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "a/Note.md", "");
        write(root, "a/b/Deep.md", "");
        write(root, "c/c.md", "existing");

        let runner = Runner::new(&settings_for(root, &[])).unwrap();
        let mut events = Vec::new();
        let stats = runner.index_tree(&mut events);

        assert!(root.join("a/a.md").is_file());
        assert!(root.join("a/b/b.md").is_file());
        assert_eq!(read(root, "c/c.md"), "existing");
        assert!(!indexer::index_path(root).exists());
        assert_eq!(stats.directories_indexed, 2);
    }
}
