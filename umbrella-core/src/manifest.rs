//! Manifest loading, root discovery and subtree selection.
//!
//! # File layout
//!
//! ```text
//! <umbrella root>/
//!   .subtrees.json
//! ```
//!
//! ```json
//! {
//!   "subtrees": {
//!     "api": {
//!       "prefix": "api",
//!       "remote_name": "api-origin",
//!       "remote_url": "git@github.com:org/api.git",
//!       "upstream_branch": "main"
//!     }
//!   }
//! }
//! ```
//!
//! Declared order is significant: it drives the order of every batch and of
//! every summary, so entries are decoded through an order-preserving visitor
//! rather than into a hash map.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::{io_err, ManifestError};
use crate::types::{Manifest, Subtree, SubtreeName, SubtreeSpec};

/// File name of the manifest, relative to the umbrella root.
pub const MANIFEST_FILE: &str = ".subtrees.json";

// ---------------------------------------------------------------------------
// 1. Paths
// ---------------------------------------------------------------------------

/// `<root>/.subtrees.json`: pure, no I/O.
pub fn manifest_path_at(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

/// Locate the umbrella root starting from `start`.
///
/// Prefers the nearest ancestor holding a manifest, then the nearest ancestor
/// holding a `.git` entry, then `start` itself.
pub fn discover_root(start: &Path) -> PathBuf {
    if let Some(dir) = start
        .ancestors()
        .find(|dir| manifest_path_at(dir).is_file())
    {
        return dir.to_path_buf();
    }
    if let Some(dir) = start.ancestors().find(|dir| dir.join(".git").exists()) {
        return dir.to_path_buf();
    }
    start.to_path_buf()
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load the manifest from `<root>/.subtrees.json`.
///
/// Returns `ManifestError::NotFound` if absent, `ManifestError::Parse` (with
/// path and line context) if the document is malformed, and a per-entry
/// error naming the subtree if an entry is incomplete.
pub fn load_at(root: &Path) -> Result<Manifest, ManifestError> {
    let path = manifest_path_at(root);
    if !path.exists() {
        return Err(ManifestError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    parse(&contents, &path)
}

/// Decode and validate a manifest document. `path` is used only for errors.
pub fn parse(contents: &str, path: &Path) -> Result<Manifest, ManifestError> {
    let raw: RawManifest = serde_json::from_str(contents).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut subtrees: Vec<Subtree> = Vec::with_capacity(raw.subtrees.0.len());
    for (name, value) in raw.subtrees.0 {
        if subtrees.iter().any(|s| s.name.0 == name) {
            return Err(ManifestError::DuplicateName { name });
        }
        let spec: SubtreeSpec = serde_json::from_value(value).map_err(|source| {
            ManifestError::InvalidEntry {
                name: name.clone(),
                source,
            }
        })?;
        if spec.normalized_prefix().trim().is_empty() {
            return Err(ManifestError::EmptyPrefix { name });
        }
        subtrees.push(Subtree {
            name: SubtreeName(name),
            spec,
        });
    }

    check_overlap(&subtrees)?;
    Ok(Manifest { subtrees })
}

/// Reject prefixes that are equal or nested inside one another.
fn check_overlap(subtrees: &[Subtree]) -> Result<(), ManifestError> {
    for (i, first) in subtrees.iter().enumerate() {
        for second in &subtrees[i + 1..] {
            let a = Path::new(first.spec.normalized_prefix());
            let b = Path::new(second.spec.normalized_prefix());
            if a.starts_with(b) || b.starts_with(a) {
                return Err(ManifestError::OverlappingPrefix {
                    first: first.name.0.clone(),
                    first_prefix: first.spec.normalized_prefix().to_string(),
                    second: second.name.0.clone(),
                    second_prefix: second.spec.normalized_prefix().to_string(),
                });
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 3. Select
// ---------------------------------------------------------------------------

/// Resolve the working set for one invocation.
///
/// No filter returns every subtree in declared order; a known filter returns
/// exactly that subtree; an unknown filter is an error listing valid names.
pub fn select<'m>(
    manifest: &'m Manifest,
    filter: Option<&str>,
) -> Result<Vec<&'m Subtree>, ManifestError> {
    match filter {
        None => Ok(manifest.subtrees.iter().collect()),
        Some(name) => manifest
            .get(name)
            .map(|subtree| vec![subtree])
            .ok_or_else(|| ManifestError::UnknownSubtree {
                name: name.to_string(),
                valid: manifest.names().map(|n| n.0.clone()).collect(),
            }),
    }
}

// ---------------------------------------------------------------------------
// 4. Raw document
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawManifest {
    subtrees: OrderedEntries,
}

/// JSON object kept as `(key, value)` pairs in document order.
struct OrderedEntries(Vec<(String, serde_json::Value)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of subtree name to subtree spec")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, serde_json::Value>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
