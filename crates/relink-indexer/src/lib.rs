//! relink Indexer
//!
//! This crate provides the scanning side of relink:
//! - Pruned directory walking over a Python source tree
//! - Import and export extraction via tree-sitter
//! - The `ProjectMap` model keyed by dotted module path
//! - Timestamped snapshot files for later comparison

mod error;
mod model;
pub mod scanner;
pub mod storage;

pub use error::IndexerError;
pub use model::{module_path_for, ModuleSnapshot, ProjectMap};
pub use scanner::{ModuleFacts, PythonParser, ScanOptions, Scanner, Walker};
pub use storage::{SnapshotFile, SnapshotStore};
