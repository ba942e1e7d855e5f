pub mod check;
pub mod cli;
pub mod config;
pub mod constants;
pub mod document;
pub mod error;
pub mod events;
pub mod indexer;
pub mod links;
pub mod pipeline;
pub mod placeholder;
pub mod resolver;
pub mod runner;
pub mod util;

pub use check::{check_tree, BrokenLink, CheckReport};
pub use cli::{Cli, Command};
pub use config::{Overrides, Settings};
pub use document::Document;
pub use error::{RelinkError, Result};
pub use events::{Event, EventSink, MarkdownLog};
pub use indexer::{build_index, IndexOutcome};
pub use pipeline::{Stage, StageContext};
pub use resolver::{FileLocator, TreeLocator};
pub use runner::{RunStats, Runner};
