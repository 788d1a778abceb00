//! Old -> new module correspondence inferred from shared exports.

use indexmap::IndexMap;
use relink_indexer::{ModuleSnapshot, ProjectMap};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// How an old module picks its successor among new modules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    /// First new module (in map order) sharing any export.
    #[default]
    FirstMatch,
    /// New module sharing the most exports; ties go to the earliest.
    MaxOverlap,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::FirstMatch => write!(f, "first-match"),
            MatchStrategy::MaxOverlap => write!(f, "max-overlap"),
        }
    }
}

impl FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-match" => Ok(MatchStrategy::FirstMatch),
            "max-overlap" => Ok(MatchStrategy::MaxOverlap),
            other => Err(format!("unknown match strategy: {}", other)),
        }
    }
}

/// Inferred mapping from old module path to new module path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Correspondence {
    mapping: IndexMap<String, String>,
}

impl Correspondence {
    /// Successor of an old module, if one was inferred.
    pub fn get(&self, old_module: &str) -> Option<&str> {
        self.mapping.get(old_module).map(String::as_str)
    }

    /// Whether an old module has a successor.
    pub fn contains(&self, old_module: &str) -> bool {
        self.mapping.contains_key(old_module)
    }

    /// Iterate `(old, new)` pairs in old-map order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mapping.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of mapped modules.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Whether nothing was mapped.
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Correspondence {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            mapping: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Infer each old module's successor in the new map.
///
/// Old modules sharing no export with any new module get no entry.
pub fn infer_correspondence(
    old: &ProjectMap,
    new: &ProjectMap,
    strategy: MatchStrategy,
) -> Correspondence {
    let mut mapping = IndexMap::new();

    for old_module in old.iter() {
        let successor = match strategy {
            MatchStrategy::FirstMatch => first_match(old_module, new),
            MatchStrategy::MaxOverlap => max_overlap(old_module, new),
        };

        if let Some(successor) = successor {
            mapping.insert(
                old_module.module_path.clone(),
                successor.module_path.clone(),
            );
        }
    }

    Correspondence { mapping }
}

fn first_match<'a>(old: &ModuleSnapshot, new: &'a ProjectMap) -> Option<&'a ModuleSnapshot> {
    new.iter().find(|candidate| !old.exports.is_disjoint(&candidate.exports))
}

fn max_overlap<'a>(old: &ModuleSnapshot, new: &'a ProjectMap) -> Option<&'a ModuleSnapshot> {
    let mut best: Option<(&ModuleSnapshot, usize)> = None;

    for candidate in new.iter() {
        let overlap = old.export_overlap(candidate);
        // Strictly greater keeps the earliest candidate on ties
        if overlap > 0 && best.map_or(true, |(_, top)| overlap > top) {
            best = Some((candidate, overlap));
        }
    }

    best.map(|(module, _)| module)
}
