//! Timestamped snapshot files of project module maps.

use crate::{IndexerError, ProjectMap};
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory (relative to the working directory) snapshots are written to.
pub const DEFAULT_SNAPSHOT_DIR: &str = "migration_data";

const SNAPSHOT_MARKER: &str = "module_map";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Writes, discovers and loads snapshot files in one directory.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at `dir`.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory holding the snapshots.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a snapshot as `[<prefix>_]module_map_<YYYYMMDD_HHMMSS>.json`.
    pub fn save(&self, map: &ProjectMap, prefix: Option<&str>) -> Result<SnapshotFile, IndexerError> {
        std::fs::create_dir_all(&self.dir)?;

        let timestamp = Local::now().naive_local();
        let name = snapshot_file_name(prefix, &timestamp);
        let path = self.dir.join(&name);

        let json = serde_json::to_string_pretty(map)?;
        std::fs::write(&path, json)?;

        info!(path = ?path, modules = map.len(), "Saved module map");

        Ok(SnapshotFile {
            path,
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
            timestamp: parse_snapshot_name(&name).and_then(|(_, ts)| ts),
        })
    }

    /// List snapshot files, sorted by file name.
    ///
    /// A missing directory yields an empty list.
    pub fn list(&self) -> Result<Vec<SnapshotFile>, IndexerError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let dir = glob::Pattern::escape(&self.dir.to_string_lossy());
        let pattern = format!("{}/*{}*.json", dir, SNAPSHOT_MARKER);

        let mut files = Vec::new();
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) => files.push(SnapshotFile::from_path(path)),
                Err(e) => debug!(error = %e, "Unreadable snapshot entry"),
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        Ok(files)
    }

    /// Load a snapshot file.
    pub fn load(path: &Path) -> Result<ProjectMap, IndexerError> {
        if !path.is_file() {
            return Err(IndexerError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let map: ProjectMap = serde_json::from_str(&content).map_err(|e| {
            IndexerError::Serialization(format!("{}: {}", path.display(), e))
        })?;

        debug!(path = ?path, modules = map.len(), "Loaded module map");

        Ok(map)
    }
}

/// Metadata about one snapshot file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    /// Full path to the file
    pub path: PathBuf,
    /// Prefix the snapshot was saved with (e.g. `original`, `new`)
    pub prefix: Option<String>,
    /// When the snapshot was taken, if the name carries a timestamp
    pub timestamp: Option<NaiveDateTime>,
}

impl SnapshotFile {
    /// Describe an existing file, recovering prefix and timestamp from its name.
    pub fn from_path(path: PathBuf) -> Self {
        let parsed = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_snapshot_name);

        let (prefix, timestamp) = parsed.unwrap_or((None, None));

        Self {
            path,
            prefix,
            timestamp,
        }
    }

    /// File name for display.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

fn snapshot_file_name(prefix: Option<&str>, timestamp: &NaiveDateTime) -> String {
    let prefix = match prefix {
        Some(p) if !p.is_empty() => format!("{}_", p),
        _ => String::new(),
    };
    format!(
        "{}{}_{}.json",
        prefix,
        SNAPSHOT_MARKER,
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

/// Split a snapshot file name into its prefix and timestamp.
///
/// Returns `None` when the name does not contain `module_map`.
pub fn parse_snapshot_name(name: &str) -> Option<(Option<String>, Option<NaiveDateTime>)> {
    let stem = name.strip_suffix(".json").unwrap_or(name);
    let idx = stem.find(SNAPSHOT_MARKER)?;

    let prefix = stem[..idx].trim_end_matches('_');
    let prefix = if prefix.is_empty() {
        None
    } else {
        Some(prefix.to_string())
    };

    let rest = stem[idx + SNAPSHOT_MARKER.len()..].trim_start_matches('_');
    let timestamp = NaiveDateTime::parse_from_str(rest, TIMESTAMP_FORMAT).ok();

    Some((prefix, timestamp))
}
