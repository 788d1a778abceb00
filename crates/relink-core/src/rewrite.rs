//! Import rewriting as a pure source-to-source transform.
//!
//! The source is parsed, the module names of matching import targets are
//! replaced in a fresh string, and the result is reparsed. Everything outside
//! the replaced names (aliases, imported names, relative dots, comments,
//! formatting) is carried over byte for byte.

use crate::CoreError;
use relink_indexer::scanner::import_targets;
use relink_indexer::{IndexerError, PythonParser};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Output of rewriting one source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    /// New source text
    pub content: String,
    /// Number of import targets replaced
    pub replaced: usize,
}

/// Rewrites import targets according to an old -> new module table.
#[derive(Debug, Clone, Default)]
pub struct ImportRewriter {
    changes: HashMap<String, String>,
}

impl ImportRewriter {
    /// Build a rewriter from `(old_import, new_import)` pairs.
    pub fn new<I>(changes: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            changes: changes.into_iter().collect(),
        }
    }

    /// Rewrite a source text.
    pub fn rewrite_source(&self, content: &str) -> Result<Rewritten, IndexerError> {
        let parser = PythonParser::new();
        let tree = parser.parse_tree(content)?;

        let mut edits: Vec<_> = import_targets(&tree, content)
            .into_iter()
            .filter_map(|target| {
                let new = self.changes.get(&target.module)?;
                (new != &target.module).then(|| (target.range, new.as_str()))
            })
            .collect();

        if edits.is_empty() {
            return Ok(Rewritten {
                content: content.to_string(),
                replaced: 0,
            });
        }

        edits.sort_by_key(|(range, _)| range.start);

        let mut output = String::with_capacity(content.len());
        let mut cursor = 0;
        for (range, replacement) in &edits {
            output.push_str(&content[cursor..range.start]);
            output.push_str(replacement);
            cursor = range.end;
        }
        output.push_str(&content[cursor..]);

        // The regenerated text must still be valid Python
        parser.parse_tree(&output)?;

        Ok(Rewritten {
            content: output,
            replaced: edits.len(),
        })
    }

    /// Rewrite a file in place.
    ///
    /// The file is left untouched when reading, parsing or regeneration fails.
    pub fn rewrite_file(&self, path: &Path) -> Result<usize, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::Rewrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let rewritten = self
            .rewrite_source(&content)
            .map_err(|e| CoreError::Rewrite {
                path: path.to_path_buf(),
                message: match e {
                    IndexerError::Parse { message, .. } => message,
                    other => other.to_string(),
                },
            })?;

        if rewritten.content != content {
            std::fs::write(path, &rewritten.content).map_err(|e| CoreError::Rewrite {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        debug!(path = ?path, replaced = rewritten.replaced, "Rewrote imports");

        Ok(rewritten.replaced)
    }
}
