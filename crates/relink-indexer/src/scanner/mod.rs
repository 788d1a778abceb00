//! Project scanner module.
//!
//! Walks a Python source tree, parses each file and builds a `ProjectMap`
//! of imports and exports keyed by dotted module path.

mod parser;
mod walker;

pub use parser::{import_targets, ImportTarget, ModuleFacts, PythonParser};
pub use walker::{Walker, DEFAULT_IGNORE_PATTERNS};

use crate::model::{module_path_for, ModuleSnapshot, ProjectMap};
use crate::IndexerError;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Options for scanning a project.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Directory name fragments to prune (case-insensitive substring match)
    pub ignore_patterns: Vec<String>,
    /// Whether to follow symlinks
    pub follow_symlinks: bool,
    /// Whether to also honor .gitignore files
    pub respect_gitignore: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            ignore_patterns: DEFAULT_IGNORE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            follow_symlinks: false,
            respect_gitignore: false,
        }
    }
}

/// The scanner that orchestrates file discovery and parsing.
pub struct Scanner {
    options: ScanOptions,
}

impl Scanner {
    /// Create a new scanner with default options.
    pub fn new() -> Self {
        Self {
            options: ScanOptions::default(),
        }
    }

    /// Create a scanner with custom options.
    pub fn with_options(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Scan a directory and return its module map.
    ///
    /// A file that cannot be read or parsed is still recorded, with empty
    /// import and export sets.
    pub fn scan(&self, root: &Path) -> Result<ProjectMap, IndexerError> {
        let start = Instant::now();

        let root = root
            .canonicalize()
            .map_err(|_| IndexerError::NotFound(root.to_path_buf()))?;

        info!(path = ?root, "Starting scan");

        let files = Walker::new(&root)
            .ignore_patterns(self.options.ignore_patterns.clone())
            .follow_symlinks(self.options.follow_symlinks)
            .respect_gitignore(self.options.respect_gitignore)
            .walk()?;

        debug!(count = files.len(), "Files discovered");

        let parser = PythonParser::new();
        let mut map = ProjectMap::new();
        let mut degraded = 0;

        for path in files {
            let Some(module_path) = module_path_for(&root, &path) else {
                debug!(path = ?path, "Skipping file without a module path");
                continue;
            };

            let facts = match read_facts(&parser, &path) {
                Ok(facts) => facts,
                Err(e) => {
                    warn!(path = ?path, error = %e, "Parse failed, recording empty module");
                    degraded += 1;
                    ModuleFacts::default()
                }
            };

            debug!(module = %module_path, "Mapped module");

            map.insert(ModuleSnapshot {
                module_path,
                file_path: path,
                imports: facts.imports,
                exports: facts.exports,
            });
        }

        if map.is_empty() {
            warn!(path = ?root, "No project Python modules found");
        }

        info!(
            modules = map.len(),
            degraded = degraded,
            duration_ms = start.elapsed().as_millis(),
            "Scan complete"
        );

        Ok(map)
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

fn read_facts(parser: &PythonParser, path: &Path) -> Result<ModuleFacts, IndexerError> {
    let content = std::fs::read_to_string(path)?;
    parser.parse(&content).map_err(|e| match e {
        IndexerError::Parse { message, .. } => IndexerError::Parse {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = tempdir().unwrap();
        let scanner = Scanner::new();

        let map = scanner.scan(temp_dir.path()).unwrap();

        assert!(map.is_empty());
    }

    #[test]
    fn test_scan_with_files() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::write(root.join("pkg/__init__.py"), "").unwrap();
        fs::write(
            root.join("pkg/models.py"),
            "import os\nfrom pkg.util import helper\n\nclass User:\n    pass\n",
        )
        .unwrap();
        fs::write(root.join("README.md"), "# Test").unwrap();

        let map = Scanner::new().scan(root).unwrap();

        assert_eq!(map.len(), 2);
        let models = map.get("pkg.models").unwrap();
        assert!(models.imports.contains("os"));
        assert!(models.imports.contains("pkg.util"));
        assert!(models.exports.contains("User"));
        assert!(models.file_path.is_absolute());
    }

    #[test]
    fn test_scan_keeps_empty_modules() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("blank.py"), "# just a comment\n").unwrap();

        let map = Scanner::new().scan(temp_dir.path()).unwrap();

        let blank = map.get("blank").unwrap();
        assert!(blank.imports.is_empty());
        assert!(blank.exports.is_empty());
    }

    #[test]
    fn test_scan_survives_parse_errors() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("bad.py"), "def broken(:\n").unwrap();
        fs::write(temp_dir.path().join("good.py"), "X = 1\n").unwrap();

        let map = Scanner::new().scan(temp_dir.path()).unwrap();

        assert_eq!(map.len(), 2);
        assert!(map.get("bad").unwrap().exports.is_empty());
        assert!(map.get("good").unwrap().exports.contains("X"));
    }

    #[test]
    fn test_scan_deeply_nested_module() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(
            root.join("big.py"),
            format!("TOTAL = {}1\n", "1 + ".repeat(50_000)),
        )
        .unwrap();
        fs::write(root.join("ok.py"), "import big\nREADY = True\n").unwrap();

        let map = Scanner::new().scan(root).unwrap();

        assert_eq!(map.len(), 2);
        assert!(map.get("big").unwrap().exports.contains("TOTAL"));
        assert!(map.get("ok").unwrap().imports.contains("big"));
    }

    #[test]
    fn test_scan_is_idempotent() {
        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join("mod_a.py"),
            "import sys\ndef run():\n    pass\nLIMIT = 3\n",
        )
        .unwrap();

        let scanner = Scanner::new();
        let first = scanner.scan(temp_dir.path()).unwrap();
        let second = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_scan_missing_root() {
        let temp_dir = tempdir().unwrap();
        let result = Scanner::new().scan(&temp_dir.path().join("missing"));

        assert!(matches!(result, Err(IndexerError::NotFound(_))));
    }

    #[test]
    fn test_scan_options_default() {
        let opts = ScanOptions::default();
        assert!(!opts.follow_symlinks);
        assert!(!opts.respect_gitignore);
        assert!(opts.ignore_patterns.iter().any(|p| p == "__pycache__"));
    }
}
