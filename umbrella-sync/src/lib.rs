//! # umbrella-sync
//!
//! Subtree orchestration against the umbrella repository.
//!
//! Build an [`AuditLog`] and an [`Executor`] over a [`GitBackend`] once, then
//! hand them to [`pipeline::run`] with the loaded manifest. Operations run one
//! subtree at a time; per-subtree failures land in the report instead of
//! aborting the batch.

pub mod audit;
pub mod batch;
pub mod error;
pub mod exec;
pub mod pipeline;
pub mod pull;
pub mod push;
pub mod status;

#[cfg(test)]
mod test_support;

pub use audit::{AuditLog, Level};
pub use batch::{BatchOptions, BatchReport, Direction, Outcome, SubtreeResult};
pub use error::SyncError;
pub use exec::{CommandOutput, Executor, GitBackend, GitOp, ProcessOutput, SystemGit, GIT_TIMEOUT};
pub use status::{StatusClass, StatusReport, SubtreeStatus};
