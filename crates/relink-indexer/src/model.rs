//! Module snapshot model keyed by dotted module path.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Facts recorded for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSnapshot {
    /// Dotted module path; stored as the map key on disk
    #[serde(skip)]
    pub module_path: String,
    /// Path to the backing file
    #[serde(rename = "path")]
    pub file_path: PathBuf,
    /// Dotted module identifiers referenced by import statements
    #[serde(default)]
    pub imports: BTreeSet<String>,
    /// Top-level symbol names defined by the file
    #[serde(default)]
    pub exports: BTreeSet<String>,
}

impl ModuleSnapshot {
    /// Create an entry with no imports and no exports.
    pub fn new(module_path: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            module_path: module_path.into(),
            file_path: file_path.into(),
            imports: BTreeSet::new(),
            exports: BTreeSet::new(),
        }
    }

    /// Builder-style helper for setting imports.
    pub fn with_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports = imports.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style helper for setting exports.
    pub fn with_exports<I, S>(mut self, exports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exports = exports.into_iter().map(Into::into).collect();
        self
    }

    /// Number of exports shared with another module.
    pub fn export_overlap(&self, other: &ModuleSnapshot) -> usize {
        self.exports.intersection(&other.exports).count()
    }
}

/// All modules found by one scan, in discovery order.
///
/// Serialized as a flat JSON object from module path to entry. Key order is
/// kept on load since rename inference walks modules in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectMap {
    modules: IndexMap<String, ModuleSnapshot>,
}

impl ProjectMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a module, replacing any entry with the same module path.
    pub fn insert(&mut self, module: ModuleSnapshot) -> Option<ModuleSnapshot> {
        self.modules.insert(module.module_path.clone(), module)
    }

    /// Look up a module by dotted path.
    pub fn get(&self, module_path: &str) -> Option<&ModuleSnapshot> {
        self.modules.get(module_path)
    }

    /// Check whether a module path is present.
    pub fn contains(&self, module_path: &str) -> bool {
        self.modules.contains_key(module_path)
    }

    /// Iterate modules in map order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleSnapshot> {
        self.modules.values()
    }

    /// Iterate module paths in map order.
    pub fn module_paths(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the map has no modules.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl FromIterator<ModuleSnapshot> for ProjectMap {
    fn from_iter<T: IntoIterator<Item = ModuleSnapshot>>(iter: T) -> Self {
        let mut map = ProjectMap::new();
        for module in iter {
            map.insert(module);
        }
        map
    }
}

impl Serialize for ProjectMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.modules.iter())
    }
}

impl<'de> Deserialize<'de> for ProjectMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut modules = IndexMap::<String, ModuleSnapshot>::deserialize(deserializer)?;
        for (key, module) in modules.iter_mut() {
            module.module_path = key.clone();
        }
        Ok(Self { modules })
    }
}

/// Derive the dotted module path of `file` relative to `root`.
///
/// Returns `None` when the file is not under the root or the relative path
/// is not valid UTF-8.
pub fn module_path_for(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }

    let last = parts.pop()?;
    parts.push(last.strip_suffix(".py").unwrap_or(last));

    let joined = parts.join(".");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_path_for_nested_file() {
        let root = Path::new("/project");
        let file = Path::new("/project/pkg/sub/mod_a.py");

        assert_eq!(
            module_path_for(root, file).as_deref(),
            Some("pkg.sub.mod_a")
        );
    }

    #[test]
    fn test_module_path_for_package_init() {
        let root = Path::new("/project");
        let file = Path::new("/project/pkg/__init__.py");

        assert_eq!(module_path_for(root, file).as_deref(), Some("pkg.__init__"));
    }

    #[test]
    fn test_module_path_outside_root() {
        let root = Path::new("/project");
        let file = Path::new("/elsewhere/mod_a.py");

        assert!(module_path_for(root, file).is_none());
    }

    #[test]
    fn test_project_map_preserves_key_order() {
        let json = r#"{
            "zeta": {"path": "zeta.py", "imports": [], "exports": ["Z"]},
            "alpha": {"path": "alpha.py", "imports": ["zeta"], "exports": []}
        }"#;

        let map: ProjectMap = serde_json::from_str(json).unwrap();
        let keys: Vec<_> = map.module_paths().collect();

        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(map.get("alpha").unwrap().module_path, "alpha");
        assert!(map.get("alpha").unwrap().imports.contains("zeta"));
    }

    #[test]
    fn test_project_map_serialization_shape() {
        let map: ProjectMap = [ModuleSnapshot::new("pkg.a", "/p/pkg/a.py")
            .with_imports(["os"])
            .with_exports(["Foo"])]
        .into_iter()
        .collect();

        let value = serde_json::to_value(&map).unwrap();

        assert_eq!(value["pkg.a"]["path"], "/p/pkg/a.py");
        assert_eq!(value["pkg.a"]["imports"][0], "os");
        assert_eq!(value["pkg.a"]["exports"][0], "Foo");
        assert!(value["pkg.a"].get("module_path").is_none());
    }

    #[test]
    fn test_missing_sets_default_to_empty() {
        let map: ProjectMap = serde_json::from_str(r#"{"m": {"path": "m.py"}}"#).unwrap();
        let module = map.get("m").unwrap();

        assert!(module.imports.is_empty());
        assert!(module.exports.is_empty());
    }

    #[test]
    fn test_export_overlap() {
        let a = ModuleSnapshot::new("a", "a.py").with_exports(["Foo", "bar"]);
        let b = ModuleSnapshot::new("b", "b.py").with_exports(["bar", "baz"]);

        assert_eq!(a.export_overlap(&b), 1);
    }
}
