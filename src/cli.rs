use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::pipeline::Stage;

/// vault-relink - Rewrite a Markdown knowledge base to relative links
///
/// ## Stages
///
/// 1. `normalize`       decode %20, reduce local link targets to file names
/// 2. `wiki-links`      [[Name]] -> [Name](Name.md)
/// 3. `resolve`         relative paths, placeholders, folder indexes
/// 4. `encode`          spaces in link targets -> %20
/// 5. `strip-metadata`  drop a leading `---` block
///
/// ```bash
/// vault-relink --root ~/vault run                      # all stages
/// vault-relink --root ~/vault run -s wiki-links -s encode
/// vault-relink --root ~/vault run --interactive        # ask per stage
/// vault-relink --root ~/vault check                    # audit links
/// vault-relink --root ~/vault index                    # folder indexes only
/// vault-relink --config relink.yaml --json run         # stats as JSON
/// ```
///
/// ## Environment Variables
///
/// - `VAULT_RELINK_ROOT`: tree root (overridden by --root)
/// - `VAULT_RELINK_NEW_FILES`: placeholder folder name (overridden by --new-files)
/// - `RUST_LOG`: tracing filter
#[derive(Parser, Debug)]
#[command(name = "vault-relink")]
#[command(version)]
#[command(about = "Rewrite a Markdown knowledge base to consistent relative links")]
pub struct Cli {
    /// YAML config file (root, new_files_folder, log_file, stages, skip_hidden)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Root directory of the document tree
    #[arg(short, long, value_name = "DIR", global = true)]
    pub root: Option<String>,

    /// Folder under the root that receives placeholder documents
    #[arg(long, value_name = "NAME", global = true)]
    pub new_files: Option<String>,

    /// Markdown run log to write
    #[arg(long, value_name = "FILE", global = true)]
    pub log: Option<PathBuf>,

    /// Debug-level tracing output on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip dot-prefixed files and folders when rewriting, indexing and checking
    #[arg(long, global = true)]
    pub skip_hidden: bool,

    /// Output in JSON format (for scripting)
    #[arg(short = 'j', long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rewrite links in every document
    Run {
        /// Stage to run (repeatable; default: all, or the config file's list)
        #[arg(short, long = "stage", value_enum, value_name = "STAGE")]
        stages: Vec<Stage>,

        /// Ask for confirmation before each selected stage
        #[arg(short, long)]
        interactive: bool,
    },

    /// Report local links whose targets do not exist
    Check,

    /// Create missing folder index documents
    Index,
}
