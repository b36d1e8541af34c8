//! Domain types for the subtree manifest.
//!
//! All types are deserialized from `.subtrees.json` via serde + serde_json and
//! are read-only once loaded.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a subtree entry in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubtreeName(pub String);

impl fmt::Display for SubtreeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SubtreeName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SubtreeName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for SubtreeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// Sync parameters for one subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtreeSpec {
    /// Directory inside the umbrella repository, relative to its root.
    pub prefix: String,
    /// Local alias under which the source repository is registered.
    pub remote_name: String,
    /// Fetch/push location of the source repository.
    pub remote_url: String,
    /// Default branch for `pull`.
    pub upstream_branch: String,
}

impl SubtreeSpec {
    /// The prefix without trailing separators, as passed to `git subtree`.
    pub fn normalized_prefix(&self) -> &str {
        self.prefix.trim_end_matches('/')
    }

    /// Absolute location of the prefix directory under `root`.
    pub fn prefix_path(&self, root: &Path) -> std::path::PathBuf {
        root.join(self.normalized_prefix())
    }
}

/// A named manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subtree {
    pub name: SubtreeName,
    #[serde(flatten)]
    pub spec: SubtreeSpec,
}

/// Every managed subtree, in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manifest {
    pub subtrees: Vec<Subtree>,
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.subtrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subtrees.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Subtree> {
        self.subtrees.iter().find(|s| s.name.0 == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &SubtreeName> {
        self.subtrees.iter().map(|s| &s.name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(prefix: &str) -> SubtreeSpec {
        SubtreeSpec {
            prefix: prefix.to_string(),
            remote_name: "api-origin".to_string(),
            remote_url: "git@example.com:org/api.git".to_string(),
            upstream_branch: "main".to_string(),
        }
    }

    #[test]
    fn newtype_display() {
        assert_eq!(SubtreeName::from("api").to_string(), "api");
    }

    #[test]
    fn newtype_equality() {
        let a = SubtreeName::from("x");
        let b = SubtreeName::from(String::from("x"));
        assert_eq!(a, b);
    }

    #[test]
    fn normalized_prefix_strips_trailing_slashes() {
        assert_eq!(spec("api/").normalized_prefix(), "api");
        assert_eq!(spec("libs/common//").normalized_prefix(), "libs/common");
        assert_eq!(spec("ui").normalized_prefix(), "ui");
    }

    #[test]
    fn prefix_path_joins_root() {
        let root = Path::new("/work/umbrella");
        assert_eq!(spec("api/").prefix_path(root), root.join("api"));
    }

    #[test]
    fn subtree_serializes_flat() {
        let subtree = Subtree {
            name: SubtreeName::from("api"),
            spec: spec("api"),
        };
        let json = serde_json::to_value(&subtree).expect("serialize");
        assert_eq!(json["name"], "api");
        assert_eq!(json["prefix"], "api");
        assert_eq!(json["upstream_branch"], "main");
    }
}
