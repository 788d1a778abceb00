//! Python import/export extraction with tree-sitter.

use crate::IndexerError;
use std::collections::BTreeSet;
use std::ops::Range;
use std::path::PathBuf;
use tracing::debug;

/// Imports and exports extracted from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleFacts {
    /// Dotted module identifiers referenced by import statements
    pub imports: BTreeSet<String>,
    /// Names of functions, classes and simple assignment targets
    pub exports: BTreeSet<String>,
}

/// One module reference inside an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTarget {
    /// Normalized dotted module name (no leading dots)
    pub module: String,
    /// Byte range of the module name in the source
    pub range: Range<usize>,
}

/// Python parser using tree-sitter.
pub struct PythonParser {
    // Tree-sitter parsers are created per call
}

impl PythonParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self {}
    }

    /// Parse source into a syntax tree, rejecting trees with syntax errors.
    pub fn parse_tree(&self, content: &str) -> Result<tree_sitter::Tree, IndexerError> {
        let mut parser = tree_sitter::Parser::new();

        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| IndexerError::Parse {
                path: PathBuf::new(),
                message: format!("Failed to set language: {}", e),
            })?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| IndexerError::Parse {
                path: PathBuf::new(),
                message: "Failed to parse content".to_string(),
            })?;

        if let Some(bad) = first_error(tree.root_node()) {
            let pos = bad.start_position();
            return Err(IndexerError::Parse {
                path: PathBuf::new(),
                message: format!("invalid syntax at line {}, column {}", pos.row + 1, pos.column + 1),
            });
        }

        Ok(tree)
    }

    /// Parse source code and extract imports and exports.
    pub fn parse(&self, content: &str) -> Result<ModuleFacts, IndexerError> {
        let tree = self.parse_tree(content)?;

        let imports = import_targets(&tree, content)
            .into_iter()
            .map(|t| t.module)
            .collect::<BTreeSet<_>>();

        let exports = collect_exports(tree.root_node(), content);

        debug!(
            import_count = imports.len(),
            export_count = exports.len(),
            "Extracted module facts"
        );

        Ok(ModuleFacts { imports, exports })
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect every import target in the tree, in source order.
pub fn import_targets(tree: &tree_sitter::Tree, content: &str) -> Vec<ImportTarget> {
    let mut targets = Vec::new();
    walk_tree(tree.root_node(), |node| {
        collect_imports(node, content, &mut targets);
        true
    });
    targets
}

/// Pre-order traversal with a cursor, so deeply nested expressions cannot
/// exhaust the stack. `visit` returns whether to descend into the node.
fn walk_tree<'t>(root: tree_sitter::Node<'t>, mut visit: impl FnMut(tree_sitter::Node<'t>) -> bool) {
    let mut cursor = root.walk();
    loop {
        if visit(cursor.node()) && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

fn collect_imports(node: tree_sitter::Node, content: &str, out: &mut Vec<ImportTarget>) {
    match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                match name.kind() {
                    "dotted_name" => push_target(name, content, out),
                    "aliased_import" => {
                        if let Some(dotted) = name.child_by_field_name("name") {
                            push_target(dotted, content, out);
                        }
                    }
                    _ => {}
                }
            }
        }
        "import_from_statement" => {
            if let Some(module) = node.child_by_field_name("module_name") {
                match module.kind() {
                    "dotted_name" => push_target(module, content, out),
                    "relative_import" => {
                        let mut cursor = module.walk();
                        let dotted = module
                            .children(&mut cursor)
                            .find(|c| c.kind() == "dotted_name");
                        // `from . import x` names no module
                        if let Some(dotted) = dotted {
                            push_target(dotted, content, out);
                        }
                    }
                    _ => {}
                }
            }
        }
        "future_import_statement" => {
            let mut cursor = node.walk();
            let future = node
                .children(&mut cursor)
                .find(|c| c.kind() == "__future__");
            if let Some(future) = future {
                out.push(ImportTarget {
                    module: "__future__".to_string(),
                    range: future.byte_range(),
                });
            }
        }
        _ => {}
    }
}

fn push_target(dotted: tree_sitter::Node, content: &str, out: &mut Vec<ImportTarget>) {
    if let Some(module) = dotted_name(dotted, content) {
        out.push(ImportTarget {
            module,
            range: dotted.byte_range(),
        });
    }
}

/// Walk the whole tree, so nested and function-local names are captured too.
fn collect_exports(root: tree_sitter::Node, content: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    walk_tree(root, |node| {
        match node.kind() {
            "function_definition" | "class_definition" => {
                if let Some(name) = node
                    .child_by_field_name("name")
                    .and_then(|n| node_text(n, content))
                {
                    if name != "__init__" {
                        out.insert(name.to_string());
                    }
                }
            }
            "assignment" => {
                // Annotated assignments are not plain assignments
                if node.child_by_field_name("type").is_none() {
                    if let Some(name) = node
                        .child_by_field_name("left")
                        .filter(|left| left.kind() == "identifier")
                        .and_then(|left| node_text(left, content))
                    {
                        out.insert(name.to_string());
                    }
                }
            }
            _ => {}
        }
        true
    });
    out
}

/// Normalize a `dotted_name` node to `a.b.c` regardless of inner whitespace.
fn dotted_name(node: tree_sitter::Node, content: &str) -> Option<String> {
    let mut cursor = node.walk();
    let parts: Vec<&str> = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "identifier")
        .filter_map(|c| node_text(c, content))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}

fn node_text<'a>(node: tree_sitter::Node, content: &'a str) -> Option<&'a str> {
    node.utf8_text(content.as_bytes()).ok()
}

fn first_error(root: tree_sitter::Node) -> Option<tree_sitter::Node> {
    let mut found = None;
    walk_tree(root, |node| {
        if found.is_some() {
            return false;
        }
        if node.is_error() || node.is_missing() {
            found = Some(node);
            return false;
        }
        node.has_error()
    });
    found
}
