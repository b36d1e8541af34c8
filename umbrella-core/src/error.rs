//! Error types for umbrella-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or querying the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Underlying I/O failure while reading the manifest.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest file did not exist at the expected path.
    #[error("Manifest not found at {path}")]
    NotFound { path: PathBuf },

    /// The document is not valid JSON or lacks the `subtrees` mapping.
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// One entry could not be decoded into a subtree spec.
    #[error("invalid manifest entry for subtree '{name}': {source}")]
    InvalidEntry {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The same subtree name is declared twice.
    #[error("subtree '{name}' is declared more than once")]
    DuplicateName { name: String },

    /// A subtree declares an empty prefix.
    #[error("subtree '{name}' has an empty prefix")]
    EmptyPrefix { name: String },

    /// Two subtrees map to the same directory, or one is nested in the other.
    #[error("subtrees '{first}' ({first_prefix}/) and '{second}' ({second_prefix}/) overlap")]
    OverlappingPrefix {
        first: String,
        first_prefix: String,
        second: String,
        second_prefix: String,
    },

    /// A `--prefix` filter named a subtree absent from the manifest.
    #[error("Unknown subtree prefix '{name}'. Valid: {}", valid.join(", "))]
    UnknownSubtree { name: String, valid: Vec<String> },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}
