//! Error types for umbrella-sync.

use thiserror::Error;

use umbrella_core::ManifestError;

/// All errors that can arise from status, push and pull operations.
///
/// A git command exiting non-zero is not an error: it is reported through
/// [`crate::exec::CommandOutput::status`]. Only failures to run the command
/// at all, or to finish it in time, surface here.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the manifest (load, validation or selection).
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The git executable could not be started.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on a running git process failed.
    #[error("failed waiting for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A git command exceeded the per-call time limit and was killed.
    #[error("`{command}` timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    /// No `--branch` override and the umbrella's current branch is unknown.
    #[error("could not determine the umbrella's current branch; pass --branch NAME")]
    BranchUnresolved,
}
