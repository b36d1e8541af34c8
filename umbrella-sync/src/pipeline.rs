//! Shared entrypoint used by the CLI.

use std::fmt;

use umbrella_core::{manifest, Manifest};

use crate::batch::{BatchOptions, BatchReport};
use crate::error::SyncError;
use crate::exec::Executor;
use crate::status::{self, StatusReport};
use crate::{pull, push};

/// What one invocation should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Status,
    Push(BatchOptions),
    Pull(BatchOptions),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Status(StatusReport),
    Batch(BatchReport),
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Status(report) => report.fmt(f),
            Report::Batch(report) => report.fmt(f),
        }
    }
}

/// Select the working set, then run `action` over it.
///
/// Selection errors are returned before the executor is used, so an unknown
/// filter never reaches git.
pub fn run(
    exec: &Executor<'_>,
    manifest: &Manifest,
    filter: Option<&str>,
    action: Action,
) -> Result<Report, SyncError> {
    let subtrees = manifest::select(manifest, filter)?;
    tracing::debug!("{} subtree(s) selected", subtrees.len());

    match action {
        Action::Status => Ok(Report::Status(status::report(exec, &subtrees))),
        Action::Push(options) => Ok(Report::Batch(push::push(exec, &subtrees, &options)?)),
        Action::Pull(options) => Ok(Report::Batch(pull::pull(exec, &subtrees, &options))),
    }
}
