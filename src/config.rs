//! Run configuration
//!
//! Settings are layered, later layers winning:
//! 1. Built-in defaults
//! 2. YAML config file (`--config`)
//! 3. Environment (`VAULT_RELINK_ROOT`, `VAULT_RELINK_NEW_FILES`)
//! 4. Command-line flags

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants as C;
use crate::error::{RelinkError, Result};
use crate::pipeline::Stage;
use crate::util;

/// Everything a run needs to know
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Tree root, as configured (may still contain `~`)
    pub root: String,
    /// Name of the placeholder folder under the root
    pub new_files_folder: String,
    /// Where the Markdown run log is written
    pub log_file: PathBuf,
    /// Stages to run; always executed in canonical order
    pub stages: BTreeSet<Stage>,
    /// Leave dot-prefixed files and directories out of the document walk,
    /// the folder indexes and the link audit. Link resolution always
    /// searches the whole tree.
    pub skip_hidden: bool,
}

/// Config file layout
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    root: Option<String>,
    new_files_folder: Option<String>,
    log_file: Option<PathBuf>,
    stages: Option<Vec<Stage>>,
    skip_hidden: Option<bool>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<String>,
    pub new_files_folder: Option<String>,
    pub log_file: Option<PathBuf>,
    pub stages: Option<Vec<Stage>>,
    pub skip_hidden: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            new_files_folder: C::DEFAULT_NEW_FILES_FOLDER.to_string(),
            log_file: PathBuf::from(C::DEFAULT_LOG_FILENAME),
            stages: Stage::ALL.into_iter().collect(),
            skip_hidden: false,
        }
    }
}

impl Settings {
    /// Build settings from all layers, reading the process environment
    pub fn load(config_file: Option<&Path>, overrides: Overrides) -> Result<Self> {
        Self::load_with_env(config_file, overrides, |key| {
            std::env::var(key).ok().filter(|s| !s.is_empty())
        })
    }

    /// Build settings with an explicit environment lookup
    pub fn load_with_env<F>(config_file: Option<&Path>, overrides: Overrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(path) = config_file {
            settings.apply_file(read_config_file(path)?);
        }

        if let Some(root) = env(C::ENV_ROOT) {
            settings.root = root;
        }
        if let Some(folder) = env(C::ENV_NEW_FILES) {
            settings.new_files_folder = folder;
        }

        settings.apply_overrides(overrides);
        settings.validate()?;
        Ok(settings)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(root) = file.root {
            self.root = root;
        }
        if let Some(folder) = file.new_files_folder {
            self.new_files_folder = folder;
        }
        if let Some(log_file) = file.log_file {
            self.log_file = log_file;
        }
        if let Some(stages) = file.stages {
            self.stages = stages.into_iter().collect();
        }
        if let Some(skip_hidden) = file.skip_hidden {
            self.skip_hidden = skip_hidden;
        }
    }

    fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(root) = overrides.root {
            self.root = root;
        }
        if let Some(folder) = overrides.new_files_folder {
            self.new_files_folder = folder;
        }
        if let Some(log_file) = overrides.log_file {
            self.log_file = log_file;
        }
        if let Some(stages) = overrides.stages {
            self.stages = stages.into_iter().collect();
        }
        if let Some(skip_hidden) = overrides.skip_hidden {
            self.skip_hidden = skip_hidden;
        }
    }

    /// The placeholder folder must be a single plain directory name
    fn validate(&self) -> Result<()> {
        let folder = self.new_files_folder.as_str();
        if folder.is_empty()
            || folder == "."
            || folder == ".."
            || folder.contains('/')
            || folder.contains('\\')
        {
            return Err(RelinkError::InvalidSetting(format!(
                "new files folder must be a plain directory name, got {:?}",
                folder
            )));
        }
        if self.root.trim().is_empty() {
            return Err(RelinkError::InvalidSetting("root must not be empty".to_string()));
        }
        Ok(())
    }

    /// Whether `stage` is part of this run
    pub fn runs(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    /// Expand and canonicalize the root; it must be an existing directory
    pub fn resolve_root(&self) -> Result<PathBuf> {
        let root = util::expand_home(&self.root);
        if !root.is_dir() {
            return Err(RelinkError::RootNotFound(root));
        }
        dunce::canonicalize(&root).map_err(|e| RelinkError::io(&root, e))
    }
}

fn read_config_file(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path).map_err(|e| RelinkError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    serde_yaml::from_str(&content).map_err(|e| RelinkError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
