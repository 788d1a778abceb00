//! Integration tests for the relink scan pipeline and snapshot storage.

use std::path::{Path, PathBuf};
use tempfile::tempdir;

use relink_indexer::{ScanOptions, Scanner, SnapshotStore};

/// Helper to create a small Python project
fn create_test_project(base: &Path) -> PathBuf {
    let project = base.join("test_project");
    let app = project.join("app");
    std::fs::create_dir_all(&app).unwrap();

    std::fs::write(app.join("__init__.py"), "").unwrap();

    std::fs::write(
        app.join("models.py"),
        r#"from dataclasses import dataclass

@dataclass
class Stream:
    url: str

DEFAULT_QUALITY = "best"
"#,
    )
    .unwrap();

    std::fs::write(
        app.join("manager.py"),
        r#"import subprocess
from app.models import Stream, DEFAULT_QUALITY
from .database import session

class StreamManager:
    def __init__(self):
        self.streams = []

    def start(self, stream: Stream):
        return subprocess.Popen(["relay", stream.url])
"#,
    )
    .unwrap();

    // Ignored directories
    std::fs::create_dir_all(project.join("tests")).unwrap();
    std::fs::write(project.join("tests/test_manager.py"), "import app.manager\n").unwrap();
    std::fs::create_dir_all(project.join(".venv/lib")).unwrap();
    std::fs::write(project.join(".venv/lib/site.py"), "X = 1\n").unwrap();

    project
}

/// Test full scan pipeline end-to-end
#[test]
fn test_scan_pipeline_end_to_end() {
    let temp_dir = tempdir().unwrap();
    let project = create_test_project(temp_dir.path());

    let map = Scanner::new().scan(&project).unwrap();

    let keys: Vec<_> = map.module_paths().collect();
    assert_eq!(keys, vec!["app.__init__", "app.manager", "app.models"]);

    let manager = map.get("app.manager").unwrap();
    assert!(manager.imports.contains("subprocess"));
    assert!(manager.imports.contains("app.models"));
    assert!(manager.imports.contains("database"));
    assert!(manager.exports.contains("StreamManager"));
    assert!(manager.exports.contains("start"));
    assert!(!manager.exports.contains("__init__"));

    let models = map.get("app.models").unwrap();
    assert!(models.exports.contains("Stream"));
    assert!(models.exports.contains("DEFAULT_QUALITY"));
    // Annotated class fields are not plain assignments
    assert!(!models.exports.contains("url"));
}

/// Test scanning with custom ignore patterns
#[test]
fn test_scan_with_custom_patterns_includes_tests() {
    let temp_dir = tempdir().unwrap();
    let project = create_test_project(temp_dir.path());

    let options = ScanOptions {
        ignore_patterns: vec![".venv".to_string()],
        ..ScanOptions::default()
    };
    let map = Scanner::with_options(options).scan(&project).unwrap();

    assert!(map.contains("tests.test_manager"));
    assert!(!map.contains(".venv.lib.site"));
}

/// Test scan -> save -> list -> load
#[test]
fn test_snapshot_roundtrip_through_store() {
    let temp_dir = tempdir().unwrap();
    let project = create_test_project(temp_dir.path());
    let store = SnapshotStore::new(temp_dir.path().join("migration_data"));

    let map = Scanner::new().scan(&project).unwrap();
    let saved = store.save(&map, Some("original")).unwrap();

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].path, saved.path);

    let loaded = SnapshotStore::load(&saved.path).unwrap();
    assert_eq!(loaded, map);
}

/// Snapshot files written by other tools load with their key order intact
#[test]
fn test_load_foreign_snapshot() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("new_module_map_20240101_120000.json");
    std::fs::write(
        &path,
        r#"{
  "svc.relay": {"path": "/p/svc/relay.py", "imports": ["svc.store"], "exports": ["Relay"]},
  "svc.store": {"path": "/p/svc/store.py", "imports": [], "exports": ["Store", "Relay"]}
}"#,
    )
    .unwrap();

    let map = SnapshotStore::load(&path).unwrap();

    let keys: Vec<_> = map.module_paths().collect();
    assert_eq!(keys, vec!["svc.relay", "svc.store"]);
    assert_eq!(map.get("svc.store").unwrap().exports.len(), 2);
}
