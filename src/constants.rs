//! Constants for vault-relink
//!
//! Delimiters, link schemes, file names and defaults shared across the
//! pipeline, the orchestrator and the CLI.

// === File and Directory Names ===

/// Default subfolder (under the tree root) for placeholder documents
pub const DEFAULT_NEW_FILES_FOLDER: &str = "newnoteflow";

/// Default run log file name
pub const DEFAULT_LOG_FILENAME: &str = "relink-log.txt";

/// Extension of documents the pipeline rewrites (without dot)
pub const MARKDOWN_EXTENSION: &str = "md";

/// Suffix appended to bare wiki-link targets
pub const MARKDOWN_SUFFIX: &str = ".md";

// === Link Syntax ===

/// Target prefixes that mark a link as external
pub const EXTERNAL_SCHEMES: &[&str] = &["http:", "https:", "onenote:"];

/// Wiki-link suffixes that already name a concrete file (compared lowercased)
pub const KNOWN_TARGET_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".md"];

/// Percent-encoded space
pub const ENCODED_SPACE: &str = "%20";

// === Metadata Block ===

/// Line that opens and closes a leading metadata block
pub const METADATA_DELIMITER: &str = "---";

/// Number of leading lines searched for the metadata block
pub const METADATA_WINDOW: usize = 9;

// === Environment Variables ===

/// Overrides the configured tree root
pub const ENV_ROOT: &str = "VAULT_RELINK_ROOT";

/// Overrides the configured placeholder folder name
pub const ENV_NEW_FILES: &str = "VAULT_RELINK_NEW_FILES";

// === Run Log ===

/// Timestamp format used in the run log
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator between index entries
pub const NEWLINE: &str = "\n";
