//! Actions shared by the subcommands and the interactive menu.

use crate::session::Session;
use anyhow::{bail, Context, Result};
use relink_core::{
    ChangeStatus, CommandTestRunner, MatchStrategy, ReconcileOptions, ReconcileReport, Reconciler,
};
use relink_indexer::{Scanner, SnapshotFile, SnapshotStore};
use std::path::Path;

/// Settings for one reconciliation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSettings {
    pub strategy: MatchStrategy,
    pub verify: bool,
    pub dry_run: bool,
    pub json: bool,
}

/// Scan `dir` and save a snapshot with an optional prefix.
///
/// The snapshot goes to `out` when given, otherwise to the configured
/// mapping directory.
pub fn scan_project(
    session: &mut Session,
    dir: &Path,
    prefix: Option<&str>,
    out: Option<&Path>,
) -> Result<SnapshotFile> {
    session.say(format!("Mapping Python modules in {}...", dir.display()))?;

    let map = Scanner::new()
        .scan(dir)
        .with_context(|| format!("Failed to scan {}", dir.display()))?;

    if map.is_empty() {
        session.say("No project Python modules found!")?;
    } else {
        session.say(format!("Found {} project Python modules", map.len()))?;
    }

    let store = match out {
        Some(out) => SnapshotStore::new(out.to_path_buf()),
        None => session.snapshot_store(),
    };
    let file = store.save(&map, prefix)?;
    session.say(format!("Module map saved to: {}", file.path.display()))?;

    Ok(file)
}

/// Print the numbered list of snapshot files and return it.
pub fn list_mappings(session: &mut Session) -> Result<Vec<SnapshotFile>> {
    let files = session.snapshot_store().list()?;

    if files.is_empty() {
        session.say(format!(
            "No mapping files found in {}",
            session.config.last_mapping_dir.display()
        ))?;
        return Ok(files);
    }

    session.say("Available mapping files:")?;
    for (i, file) in files.iter().enumerate() {
        session.say(format!("{}. {}", i + 1, file.file_name()))?;
    }

    Ok(files)
}

/// Pretty-print a snapshot file.
pub fn show_mapping(session: &mut Session, path: &Path) -> Result<()> {
    let map = SnapshotStore::load(path)?;
    session.say(serde_json::to_string_pretty(&map)?)?;
    Ok(())
}

/// Reconcile two snapshot files, print the results and remember them.
pub fn run_reconciliation(
    session: &mut Session,
    old: &Path,
    new: &Path,
    settings: RunSettings,
) -> Result<()> {
    let source_dir = session.config.source_truth_dir.clone();
    if !source_dir.is_dir() {
        bail!("Invalid source truth directory: {}", source_dir.display());
    }

    let options = ReconcileOptions {
        strategy: settings.strategy,
        dry_run: settings.dry_run,
        source_truth_dir: Some(source_dir.clone()),
    };

    let mut reconciler = Reconciler::new(options);
    if settings.verify {
        if let Some((program, args)) = session.config.test_command_parts() {
            reconciler = reconciler
                .with_test_runner(CommandTestRunner::new(program).args(args).current_dir(source_dir));
        }
    }

    let report = reconciler.reconcile_files(old, new)?;

    if settings.json {
        session.say(report.to_json_pretty()?)?;
    } else {
        render_report(session, &report)?;
    }

    session.last_report = Some(report);
    Ok(())
}

/// Human-readable rendering of a report.
pub fn render_report(session: &mut Session, report: &ReconcileReport) -> Result<()> {
    session.say(format!("Found {} import changes needed", report.changes.len()))?;

    for (old, new) in report.correspondence.iter() {
        if old != new {
            session.say(format!("  {} -> {}", old, new))?;
        }
    }

    if report.dry_run {
        for change in &report.changes {
            session.say(format!(
                "  {}: {} -> {}",
                change.file_path.display(),
                change.old_import,
                change.new_import
            ))?;
        }
    }

    for file in &report.files {
        session.say("")?;
        session.say(format!("Updating imports in: {}", file.file_path.display()))?;
        match &file.error {
            None => session.say("✓ Successfully updated imports")?,
            Some(e) => session.say(format!("✗ Failed to update imports: {}", e))?,
        }
    }

    for module in &report.unreferenced {
        session.say(format!(
            "! {} was matched but is never imported by that path",
            module
        ))?;
    }
    for module in &report.unlocated {
        session.say(format!("! {} was not found in the source truth directory", module))?;
    }

    if let Some(outcome) = &report.verification {
        session.say("")?;
        if outcome.success {
            session.say("✓ All tests passed")?;
        } else {
            session.say("✗ Some tests failed")?;
            session.say("")?;
            session.say("Test output:")?;
            session.say(&outcome.output)?;
        }
    }

    session.say("")?;
    session.say(report.summary())?;
    if report.count(ChangeStatus::Error) > 0 {
        session.say("Failed files were left unchanged; other files keep their new imports.")?;
    }

    Ok(())
}
