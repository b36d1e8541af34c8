//! Subcommand implementations.

pub mod pull;
pub mod status;
pub mod sync;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use umbrella_core::{manifest, Manifest};
use umbrella_sync::{
    pipeline::{self, Action, Report},
    AuditLog, BatchOptions, Executor, SystemGit,
};

/// State shared by every subcommand for one invocation.
pub struct Session {
    pub root: PathBuf,
    pub log: AuditLog,
}

impl Session {
    /// Load the manifest and run `action` over the selected subtrees with the
    /// system `git`.
    pub fn run(&self, prefix: Option<&str>, action: Action) -> Result<Report> {
        let manifest: Manifest = manifest::load_at(&self.root)?;
        let git = SystemGit::new();
        let exec = Executor::new(&git, &self.root, &self.log);
        Ok(pipeline::run(&exec, &manifest, prefix, action)?)
    }
}

/// Options shared by `sync` and `pull`.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Only act on this subtree (its name in `.subtrees.json`).
    #[arg(long, value_name = "NAME", allow_hyphen_values = true)]
    pub prefix: Option<String>,

    /// Branch on the source repositories to push to or pull from.
    #[arg(long, value_name = "NAME", allow_hyphen_values = true)]
    pub branch: Option<String>,

    /// Log the git commands that would run without running them.
    #[arg(long)]
    pub dry_run: bool,
}

impl BatchArgs {
    pub fn options(&self) -> BatchOptions {
        BatchOptions {
            branch: self.branch.clone(),
            dry_run: self.dry_run,
        }
    }
}
