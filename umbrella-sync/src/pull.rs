//! `pull`: squash-merge each source repository back into its prefix.
//!
//! Unlike push, the branch is chosen per subtree: the `--branch` override,
//! else that subtree's own `upstream_branch`.

use umbrella_core::Subtree;

use crate::batch::{print_header, run_batch, BatchOptions, BatchReport, Direction};
use crate::exec::{Executor, GitOp};

/// Pull every subtree in `subtrees`, in order, with `--squash`.
pub fn pull(exec: &Executor<'_>, subtrees: &[&Subtree], options: &BatchOptions) -> BatchReport {
    let mut banner = Vec::new();
    if let Some(branch) = &options.branch {
        banner.push(format!("Branch override: {branch}"));
    }
    print_header("SUBTREE PULL (update from source repos)", &banner, options.dry_run);

    let results = run_batch(
        exec,
        Direction::Pull,
        subtrees,
        options.dry_run,
        |subtree| {
            options
                .branch
                .clone()
                .unwrap_or_else(|| subtree.spec.upstream_branch.clone())
        },
        |subtree, branch| GitOp::SubtreePull {
            prefix: subtree.spec.normalized_prefix().to_string(),
            remote: subtree.spec.remote_name.clone(),
            branch: branch.to_string(),
            squash: true,
        },
    );

    BatchReport {
        direction: Direction::Pull,
        dry_run: options.dry_run,
        target_branch: None,
        results,
    }
}
