//! Reconciliation engine.
//!
//! Given an old and a new module map, infers which old modules became which
//! new ones, derives the import edits each old file needs and applies them
//! one file at a time. A failing file is reported and skipped; files already
//! written stay written.

mod changes;
mod correspondence;

pub use changes::{derive_changes, group_by_file, ChangeStatus, ImportChange};
pub use correspondence::{infer_correspondence, Correspondence, MatchStrategy};

use crate::report::{FileOutcome, ReconcileReport};
use crate::rewrite::ImportRewriter;
use crate::verify::{verify_module_location, TestRunner};
use crate::CoreError;
use relink_indexer::{ProjectMap, SnapshotStore};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Options for one reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Successor selection policy
    pub strategy: MatchStrategy,
    /// Compute changes without touching any file
    pub dry_run: bool,
    /// Restructured project root used to locate new modules
    pub source_truth_dir: Option<PathBuf>,
}

/// Drives correspondence inference, edit derivation, rewriting and verification.
pub struct Reconciler {
    options: ReconcileOptions,
    runner: Option<Box<dyn TestRunner>>,
}

impl Reconciler {
    /// Create a reconciler without a verification step.
    pub fn new(options: ReconcileOptions) -> Self {
        Self {
            options,
            runner: None,
        }
    }

    /// Run `runner` after all files were processed.
    pub fn with_test_runner(mut self, runner: impl TestRunner + 'static) -> Self {
        self.runner = Some(Box::new(runner));
        self
    }

    /// Load two snapshot files and reconcile them.
    ///
    /// Fails before any edit when either snapshot is missing or malformed.
    pub fn reconcile_files(
        &self,
        old_path: &Path,
        new_path: &Path,
    ) -> Result<ReconcileReport, CoreError> {
        let old = SnapshotStore::load(old_path).map_err(CoreError::Mapping)?;
        let new = SnapshotStore::load(new_path).map_err(CoreError::Mapping)?;

        info!(
            old = ?old_path,
            new = ?new_path,
            old_modules = old.len(),
            new_modules = new.len(),
            "Loaded mapping files"
        );

        Ok(self.reconcile(&old, &new))
    }

    /// Reconcile two module maps and rewrite the affected files.
    pub fn reconcile(&self, old: &ProjectMap, new: &ProjectMap) -> ReconcileReport {
        let correspondence = infer_correspondence(old, new, self.options.strategy);
        info!(
            mapped = correspondence.len(),
            strategy = %self.options.strategy,
            "Inferred module correspondence"
        );

        let mut changes = derive_changes(old, &correspondence);
        info!(changes = changes.len(), "Import changes needed");

        let unreferenced = unreferenced_mappings(&correspondence, &changes);
        let unlocated = match &self.options.source_truth_dir {
            Some(dir) => unlocated_targets(dir, &changes),
            None => Vec::new(),
        };

        let files = if self.options.dry_run {
            Vec::new()
        } else {
            apply_changes(&mut changes)
        };

        let verification = match (&self.runner, self.options.dry_run) {
            (Some(runner), false) => Some(runner.run()),
            _ => None,
        };

        ReconcileReport {
            strategy: self.options.strategy,
            correspondence,
            changes,
            files,
            unreferenced,
            unlocated,
            dry_run: self.options.dry_run,
            verification,
        }
    }
}

/// Apply pending changes file by file, updating each change's status.
///
/// All changes for a file are applied in one rewrite. A failure marks that
/// file's changes as errors and moves on to the next file.
pub fn apply_changes(changes: &mut [ImportChange]) -> Vec<FileOutcome> {
    let groups = group_by_file(changes);
    let mut outcomes = Vec::with_capacity(groups.len());

    for (path, indices) in groups {
        let rewriter = ImportRewriter::new(indices.iter().map(|&i| {
            (changes[i].old_import.clone(), changes[i].new_import.clone())
        }));

        let (status, error_text) = match rewriter.rewrite_file(&path) {
            Ok(replaced) => {
                info!(path = ?path, replaced = replaced, "Updated imports");
                (ChangeStatus::Success, None)
            }
            Err(e) => {
                error!(path = ?path, error = %e, "Failed to update imports");
                (ChangeStatus::Error, Some(e.to_string()))
            }
        };

        for &i in &indices {
            changes[i].status = status;
        }

        outcomes.push(FileOutcome {
            file_path: path,
            changes: indices.len(),
            error: error_text,
        });
    }

    outcomes
}

/// Renamed old modules that no change refers to.
fn unreferenced_mappings(correspondence: &Correspondence, changes: &[ImportChange]) -> Vec<String> {
    let referenced: BTreeSet<&str> = changes.iter().map(|c| c.old_import.as_str()).collect();

    correspondence
        .iter()
        .filter(|(old, new)| old != new && !referenced.contains(old))
        .map(|(old, _)| old.to_string())
        .collect()
}

fn unlocated_targets(source_dir: &Path, changes: &[ImportChange]) -> Vec<String> {
    let targets: BTreeSet<&str> = changes.iter().map(|c| c.new_import.as_str()).collect();

    targets
        .into_iter()
        .filter(|target| {
            let found = verify_module_location(source_dir, target);
            if !found {
                warn!(module = %target, dir = ?source_dir, "New module not found in source tree");
            }
            !found
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::TestOutcome;
    use relink_indexer::ModuleSnapshot;
    use std::cell::Cell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::tempdir;

    struct FakeRunner {
        calls: Rc<Cell<usize>>,
        success: bool,
    }

    impl TestRunner for FakeRunner {
        fn run(&self) -> TestOutcome {
            self.calls.set(self.calls.get() + 1);
            TestOutcome {
                success: self.success,
                output: "collected 0 items".to_string(),
            }
        }
    }

    fn scenario(dir: &Path) -> (ProjectMap, ProjectMap, PathBuf) {
        let main = dir.join("main.py");
        fs::write(&main, "import pkg.a\nfrom pkg.a import Foo\n").unwrap();

        let old: ProjectMap = [
            ModuleSnapshot::new("pkg.a", dir.join("pkg/a.py")).with_exports(["Foo"]),
            ModuleSnapshot::new("main", &main).with_imports(["pkg.a"]),
        ]
        .into_iter()
        .collect();
        let new: ProjectMap = [ModuleSnapshot::new("pkg.b", dir.join("pkg/b.py")).with_exports(["Foo"])]
            .into_iter()
            .collect();

        (old, new, main)
    }

    #[test]
    fn test_reconcile_rewrites_importer() {
        let temp_dir = tempdir().unwrap();
        let (old, new, main) = scenario(temp_dir.path());

        let report = Reconciler::new(ReconcileOptions::default()).reconcile(&old, &new);

        assert_eq!(report.correspondence.get("pkg.a"), Some("pkg.b"));
        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.changes[0].status, ChangeStatus::Success);
        assert_eq!(
            fs::read_to_string(&main).unwrap(),
            "import pkg.b\nfrom pkg.b import Foo\n"
        );
        assert!(report.verification.is_none());
    }

    #[test]
    fn test_dry_run_leaves_files_alone() {
        let temp_dir = tempdir().unwrap();
        let (old, new, main) = scenario(temp_dir.path());
        let calls = Rc::new(Cell::new(0));

        let options = ReconcileOptions {
            dry_run: true,
            ..Default::default()
        };
        let report = Reconciler::new(options)
            .with_test_runner(FakeRunner {
                calls: calls.clone(),
                success: true,
            })
            .reconcile(&old, &new);

        assert!(report.dry_run);
        assert_eq!(report.count(ChangeStatus::Pending), 1);
        assert!(report.files.is_empty());
        assert_eq!(calls.get(), 0);
        assert_eq!(
            fs::read_to_string(&main).unwrap(),
            "import pkg.a\nfrom pkg.a import Foo\n"
        );
    }

    #[test]
    fn test_verification_runs_once_and_is_advisory() {
        let temp_dir = tempdir().unwrap();
        let (old, new, main) = scenario(temp_dir.path());
        let calls = Rc::new(Cell::new(0));

        let report = Reconciler::new(ReconcileOptions::default())
            .with_test_runner(FakeRunner {
                calls: calls.clone(),
                success: false,
            })
            .reconcile(&old, &new);

        assert_eq!(calls.get(), 1);
        assert!(!report.verification.as_ref().unwrap().success);
        // Failed tests do not undo edits
        assert!(fs::read_to_string(&main).unwrap().contains("pkg.b"));
    }

    #[test]
    fn test_unreferenced_and_unlocated() {
        let temp_dir = tempdir().unwrap();
        let (mut old, new, _) = scenario(temp_dir.path());
        old.insert(ModuleSnapshot::new("pkg.orphan", "/p/pkg/orphan.py").with_exports(["Foo"]));

        let options = ReconcileOptions {
            source_truth_dir: Some(temp_dir.path().to_path_buf()),
            dry_run: true,
            ..Default::default()
        };
        let report = Reconciler::new(options).reconcile(&old, &new);

        assert_eq!(report.unreferenced, vec!["pkg.orphan".to_string()]);
        assert_eq!(report.unlocated, vec!["pkg.b".to_string()]);
    }

    #[test]
    fn test_apply_changes_isolates_failures() {
        let temp_dir = tempdir().unwrap();
        let good = temp_dir.path().join("good.py");
        let bad = temp_dir.path().join("bad.py");
        fs::write(&good, "import old.mod\n").unwrap();
        fs::write(&bad, "import old.mod\nif True\n").unwrap();

        let mut changes = vec![
            ImportChange::new(&bad, "old.mod", "new.mod"),
            ImportChange::new(&good, "old.mod", "new.mod"),
        ];

        let outcomes = apply_changes(&mut changes);

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].succeeded());
        assert!(outcomes[1].succeeded());
        assert_eq!(changes[0].status, ChangeStatus::Error);
        assert_eq!(changes[1].status, ChangeStatus::Success);
        assert_eq!(fs::read_to_string(&bad).unwrap(), "import old.mod\nif True\n");
        assert_eq!(fs::read_to_string(&good).unwrap(), "import new.mod\n");
    }

    #[test]
    fn test_reconcile_files_missing_mapping() {
        let temp_dir = tempdir().unwrap();
        let present = temp_dir.path().join("old_module_map.json");
        fs::write(&present, "{}").unwrap();

        let result = Reconciler::new(ReconcileOptions::default())
            .reconcile_files(&present, &temp_dir.path().join("absent.json"));

        assert!(matches!(result, Err(CoreError::Mapping(_))));
    }
}
