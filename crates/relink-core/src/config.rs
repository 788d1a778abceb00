//! Configuration for the reconciler, stored as an ini file.

use crate::CoreError;
use ini::{EscapePolicy, Ini, ParseOption, WriteOption};
use relink_indexer::storage::DEFAULT_SNAPSHOT_DIR;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".import_reconciler.ini";

const SECTION: &str = "DEFAULT";
const KEY_MAPPING_DIR: &str = "last_mapping_dir";
const KEY_SOURCE_DIR: &str = "source_truth_dir";
const KEY_OLD_MAP: &str = "old_map";
const KEY_NEW_MAP: &str = "new_map";
const KEY_TEST_COMMAND: &str = "test_command";

/// Reconciler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Directory holding snapshot files
    pub last_mapping_dir: PathBuf,

    /// Root of the restructured project
    pub source_truth_dir: PathBuf,

    /// Selected original snapshot
    pub old_map: Option<PathBuf>,

    /// Selected new snapshot
    pub new_map: Option<PathBuf>,

    /// Command used to verify the project after rewriting
    pub test_command: String,
}

fn default_test_command() -> String {
    "pytest".to_string()
}

impl ReconcilerConfig {
    /// Defaults relative to a project root.
    pub fn defaults_for(root: &Path) -> Self {
        Self {
            last_mapping_dir: root.join(DEFAULT_SNAPSHOT_DIR),
            source_truth_dir: root.to_path_buf(),
            old_map: None,
            new_map: None,
            test_command: default_test_command(),
        }
    }

    /// Load the config file, creating it with defaults for `root` if absent.
    pub fn load_or_create(path: &Path, root: &Path) -> Result<Self, CoreError> {
        if path.exists() {
            return Self::load_from(path, root);
        }

        let config = Self::defaults_for(root);
        config.save(path)?;
        info!(path = ?path, "Created default configuration");
        Ok(config)
    }

    /// Load configuration from a specific path.
    ///
    /// Missing keys fall back to the defaults for `root`.
    pub fn load_from(path: &Path, root: &Path) -> Result<Self, CoreError> {
        let opt = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..Default::default()
        };
        let conf = Ini::load_from_file_opt(path, opt)?;
        let defaults = Self::defaults_for(root);

        let Some(section) = conf.section(Some(SECTION)) else {
            debug!(path = ?path, "No DEFAULT section, using defaults");
            return Ok(defaults);
        };

        let non_empty = |key: &str| section.get(key).map(str::trim).filter(|v| !v.is_empty());

        Ok(Self {
            last_mapping_dir: non_empty(KEY_MAPPING_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.last_mapping_dir),
            source_truth_dir: non_empty(KEY_SOURCE_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.source_truth_dir),
            old_map: non_empty(KEY_OLD_MAP).map(PathBuf::from),
            new_map: non_empty(KEY_NEW_MAP).map(PathBuf::from),
            test_command: non_empty(KEY_TEST_COMMAND)
                .map(str::to_string)
                .unwrap_or(defaults.test_command),
        })
    }

    /// Write the configuration back to disk.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let mut conf = Ini::new();
        conf.with_section(Some(SECTION))
            .set(KEY_MAPPING_DIR, self.last_mapping_dir.to_string_lossy())
            .set(KEY_SOURCE_DIR, self.source_truth_dir.to_string_lossy())
            .set(KEY_TEST_COMMAND, self.test_command.as_str());

        if let Some(old) = &self.old_map {
            conf.with_section(Some(SECTION))
                .set(KEY_OLD_MAP, old.to_string_lossy());
        }
        if let Some(new) = &self.new_map {
            conf.with_section(Some(SECTION))
                .set(KEY_NEW_MAP, new.to_string_lossy());
        }

        let opt = WriteOption {
            escape_policy: EscapePolicy::Nothing,
            ..Default::default()
        };
        conf.write_to_file_opt(path, opt)?;

        debug!(path = ?path, "Saved configuration");
        Ok(())
    }

    /// Record the original and new snapshot selection.
    pub fn select_maps(&mut self, old: PathBuf, new: PathBuf) {
        self.old_map = Some(old);
        self.new_map = Some(new);
    }

    /// Change the source-truth directory, rejecting paths that are not directories.
    pub fn set_source_truth_dir(&mut self, dir: &Path) -> Result<(), CoreError> {
        if !dir.is_dir() {
            return Err(CoreError::Config(format!(
                "Invalid directory path: {}",
                dir.display()
            )));
        }
        self.source_truth_dir = dir.to_path_buf();
        Ok(())
    }

    /// The selected snapshot pair, which must both exist.
    pub fn selected_maps(&self) -> Result<(&Path, &Path), CoreError> {
        let (Some(old), Some(new)) = (&self.old_map, &self.new_map) else {
            return Err(CoreError::Config(
                "Please select mapping files first".to_string(),
            ));
        };

        for path in [old, new] {
            if !path.is_file() {
                return Err(CoreError::Mapping(relink_indexer::IndexerError::NotFound(
                    path.clone(),
                )));
            }
        }

        Ok((old.as_path(), new.as_path()))
    }

    /// Split the test command into program and arguments.
    pub fn test_command_parts(&self) -> Option<(String, Vec<String>)> {
        let mut parts = self.test_command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some((program, parts.collect()))
    }
}
