//! Import edits derived from a correspondence.

use super::Correspondence;
use indexmap::IndexMap;
use relink_indexer::ProjectMap;
use serde::Serialize;
use std::path::PathBuf;

/// Lifecycle of a proposed edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    #[default]
    Pending,
    Success,
    Error,
}

/// One import target in one file to be rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportChange {
    pub file_path: PathBuf,
    pub old_import: String,
    pub new_import: String,
    pub status: ChangeStatus,
}

impl ImportChange {
    /// A pending change.
    pub fn new(
        file_path: impl Into<PathBuf>,
        old_import: impl Into<String>,
        new_import: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            old_import: old_import.into(),
            new_import: new_import.into(),
            status: ChangeStatus::Pending,
        }
    }
}

/// Derive the edits needed in every old module.
///
/// An import is rewritten only when the imported path is itself a mapped old
/// module. Imports of untracked modules are never touched, and a module
/// mapped onto its own path needs no edit.
pub fn derive_changes(old: &ProjectMap, correspondence: &Correspondence) -> Vec<ImportChange> {
    let mut changes = Vec::new();

    for module in old.iter() {
        for import in &module.imports {
            let Some(target) = correspondence.get(import) else {
                continue;
            };
            if target != import.as_str() {
                changes.push(ImportChange::new(
                    module.file_path.clone(),
                    import.as_str(),
                    target,
                ));
            }
        }
    }

    changes
}

/// Group change indices by file, in first-seen order.
pub fn group_by_file(changes: &[ImportChange]) -> IndexMap<PathBuf, Vec<usize>> {
    let mut groups: IndexMap<PathBuf, Vec<usize>> = IndexMap::new();
    for (idx, change) in changes.iter().enumerate() {
        groups
            .entry(change.file_path.clone())
            .or_default()
            .push(idx);
    }
    groups
}
