//! File system walker that prunes ignored directories.

use crate::IndexerError;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name fragments skipped during a scan.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    // Virtual environments
    ".venv",
    "venv",
    "env",
    // Python caches
    "__pycache__",
    ".pytest_cache",
    // Version control
    ".git",
    ".github",
    // IDEs
    ".idea",
    ".vscode",
    // Dependencies
    "node_modules",
    "site-packages",
    "dist-packages",
    // Build artifacts
    "build",
    "dist",
    "egg-info",
    // Testing
    ".tox",
    ".coverage",
    "migrations",
    "tests",
    "test",
];

/// Walks a source tree and yields Python files outside ignored directories.
pub struct Walker {
    root: PathBuf,
    ignore_patterns: Vec<String>,
    follow_symlinks: bool,
    respect_gitignore: bool,
}

impl Walker {
    /// Create a new walker with the default ignore patterns.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            ignore_patterns: DEFAULT_IGNORE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            follow_symlinks: false,
            respect_gitignore: false,
        }
    }

    /// Replace the ignore patterns.
    pub fn ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns
            .into_iter()
            .map(|p| p.to_lowercase())
            .collect();
        self
    }

    /// Follow symbolic links while walking.
    pub fn follow_symlinks(mut self, yes: bool) -> Self {
        self.follow_symlinks = yes;
        self
    }

    /// Also honor .gitignore files found in the tree.
    pub fn respect_gitignore(mut self, yes: bool) -> Self {
        self.respect_gitignore = yes;
        self
    }

    /// Walk the tree and return all Python files, sorted by path.
    pub fn walk(&self) -> Result<Vec<PathBuf>, IndexerError> {
        if !self.root.is_dir() {
            return Err(IndexerError::NotFound(self.root.clone()));
        }

        let patterns = self.ignore_patterns.clone();
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
                if !is_dir {
                    return true;
                }
                let pruned = is_ignored_dir(&entry.file_name().to_string_lossy(), &patterns);
                if pruned {
                    debug!(path = ?entry.path(), "Pruned ignored directory");
                }
                !pruned
            })
            .build();

        let mut files = Vec::new();
        for result in walker {
            match result {
                Ok(entry) => {
                    // Symlinked files count even when links are not followed
                    if is_python_file(entry.path()) && entry.path().is_file() {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    // Don't fail the entire walk for individual errors
                    debug!(error = %e, "Walk error");
                }
            }
        }

        files.sort();

        Ok(files)
    }
}

/// Whether a directory name matches any ignore pattern.
///
/// Matching is a case-insensitive substring test against lowercased
/// patterns, so `egg-info` prunes `mypkg.egg-info`.
fn is_ignored_dir(name: &str, patterns: &[String]) -> bool {
    let name = name.to_lowercase();
    patterns.iter().any(|p| name.contains(p.as_str()))
}

fn is_python_file(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "py")
}
