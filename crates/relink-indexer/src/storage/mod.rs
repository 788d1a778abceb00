//! Persistence for module snapshots.

mod snapshot;

pub use snapshot::{parse_snapshot_name, SnapshotFile, SnapshotStore, DEFAULT_SNAPSHOT_DIR};
