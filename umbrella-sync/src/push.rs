//! `sync`: push each subtree's history to its source repository.
//!
//! The target branch is the `--branch` override, else the umbrella's current
//! branch, resolved once for the whole batch.

use umbrella_core::Subtree;

use crate::batch::{print_header, run_batch, BatchOptions, BatchReport, Direction};
use crate::error::SyncError;
use crate::exec::{Executor, GitOp};

/// Stand-in target listed by a dry run when the current branch is unknown.
pub const UNRESOLVED_BRANCH: &str = "<current-branch>";

/// Push every subtree in `subtrees`, in order.
///
/// Fails only when no target branch can be determined; that check happens
/// before any push runs. A dry run never fails on it: it warns and lists the
/// commands against [`UNRESOLVED_BRANCH`]. Per-subtree failures are recorded
/// in the report.
pub fn push(
    exec: &Executor<'_>,
    subtrees: &[&Subtree],
    options: &BatchOptions,
) -> Result<BatchReport, SyncError> {
    let current = exec.current_branch();
    let target = match options.branch.clone().or_else(|| current.clone()) {
        Some(branch) => branch,
        None if options.dry_run => {
            exec.log().warn(format!(
                "could not determine the umbrella's current branch; listing pushes to {UNRESOLVED_BRANCH}"
            ));
            UNRESOLVED_BRANCH.to_string()
        }
        None => return Err(SyncError::BranchUnresolved),
    };

    print_header(
        "SUBTREE SYNC (push to source repos)",
        &[
            format!("Umbrella branch: {}", current.as_deref().unwrap_or("(unknown)")),
            format!("Target branch on source repos: {target}"),
        ],
        options.dry_run,
    );

    let results = run_batch(
        exec,
        Direction::Push,
        subtrees,
        options.dry_run,
        |_| target.clone(),
        |subtree, branch| GitOp::SubtreePush {
            prefix: subtree.spec.normalized_prefix().to_string(),
            remote: subtree.spec.remote_name.clone(),
            branch: branch.to_string(),
        },
    );

    Ok(BatchReport {
        direction: Direction::Push,
        dry_run: options.dry_run,
        target_branch: Some(target),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Outcome;
    use crate::test_support::{fail, manifest, ok, without_timestamp, RecordingBackend, TestEnv};
    use umbrella_core::manifest::select;

    fn pushes(backend: &RecordingBackend) -> Vec<GitOp> {
        backend.calls().into_iter().filter(GitOp::mutates).collect()
    }

    #[test]
    fn pushes_every_subtree_in_manifest_order_to_current_branch() {
        let env = TestEnv::new();
        let backend = RecordingBackend::new(|op| match op {
            GitOp::CurrentBranch => ok("feature/login"),
            _ => ok(""),
        });
        let m = manifest(&[("ui", "ui", "main"), ("api", "api", "develop"), ("common", "common", "main")]);

        let report = push(
            &env.executor(&backend),
            &select(&m, None).unwrap(),
            &BatchOptions::default(),
        )
        .expect("push");

        let names: Vec<_> = report.results.iter().map(|r| r.name.0.as_str()).collect();
        assert_eq!(names, ["ui", "api", "common"]);
        assert!(report.results.iter().all(|r| r.outcome == Outcome::Ok));
        assert_eq!(report.target_branch.as_deref(), Some("feature/login"));
        assert_eq!(
            pushes(&backend),
            vec![
                GitOp::SubtreePush { prefix: "ui".into(), remote: "ui-origin".into(), branch: "feature/login".into() },
                GitOp::SubtreePush { prefix: "api".into(), remote: "api-origin".into(), branch: "feature/login".into() },
                GitOp::SubtreePush { prefix: "common".into(), remote: "common-origin".into(), branch: "feature/login".into() },
            ]
        );
        // Resolved once per batch, not per subtree.
        let lookups = backend.calls().iter().filter(|op| **op == GitOp::CurrentBranch).count();
        assert_eq!(lookups, 1);
    }

    #[test]
    fn branch_override_wins_over_current_branch() {
        let env = TestEnv::new();
        let backend = RecordingBackend::new(|op| match op {
            GitOp::CurrentBranch => ok("main"),
            _ => ok(""),
        });
        let m = manifest(&[("api", "api", "main"), ("ui", "ui", "main")]);
        let options = BatchOptions {
            branch: Some("release-1".into()),
            dry_run: false,
        };

        let report = push(&env.executor(&backend), &select(&m, None).unwrap(), &options).expect("push");

        assert!(report.results.iter().all(|r| r.branch == "release-1"));
        assert!(pushes(&backend).iter().all(|op| matches!(
            op,
            GitOp::SubtreePush { branch, .. } if branch == "release-1"
        )));
    }

    #[test]
    fn one_failure_does_not_stop_the_batch() {
        let env = TestEnv::new();
        let backend = RecordingBackend::new(|op| match op {
            GitOp::CurrentBranch => ok("main"),
            GitOp::SubtreePush { prefix, .. } if prefix == "api" => fail(1, "rejected"),
            GitOp::SubtreePush { prefix, .. } if prefix == "ui" => Err(SyncError::Timeout {
                command: op.to_string(),
                timeout_secs: 300,
            }),
            _ => ok("pushed"),
        });
        let m = manifest(&[("api", "api", "main"), ("ui", "ui", "main"), ("common", "common", "main")]);

        let report = push(
            &env.executor(&backend),
            &select(&m, None).unwrap(),
            &BatchOptions::default(),
        )
        .expect("push");

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.outcome_of("api"), Some(Outcome::Failed));
        assert_eq!(report.outcome_of("ui"), Some(Outcome::Failed));
        assert_eq!(report.outcome_of("common"), Some(Outcome::Ok));
        assert_eq!(pushes(&backend).len(), 3);

        let lines = env.audit_lines();
        assert!(lines.iter().any(|l| l.contains("[ERROR] FAILED to sync 'api'. Check output above.")));
        assert!(lines.iter().any(|l| l.contains("[ERROR] FAILED to sync 'ui'") && l.contains("timed out")));
        assert!(lines.iter().any(|l| l.contains("[INFO] Successfully synced 'common'.")));
    }

    #[test]
    fn filtered_push_touches_only_the_selected_subtree() {
        let env = TestEnv::new();
        let backend = RecordingBackend::new(|op| match op {
            GitOp::CurrentBranch => ok("main"),
            _ => ok(""),
        });
        let m = manifest(&[("api", "api", "main"), ("ui", "ui", "main")]);

        let report = push(
            &env.executor(&backend),
            &select(&m, Some("ui")).unwrap(),
            &BatchOptions::default(),
        )
        .expect("push");

        assert_eq!(report.results.len(), 1);
        assert_eq!(
            pushes(&backend),
            vec![GitOp::SubtreePush { prefix: "ui".into(), remote: "ui-origin".into(), branch: "main".into() }]
        );
    }

    #[test]
    fn unresolved_branch_stops_before_any_push() {
        let env = TestEnv::new();
        let backend = RecordingBackend::new(|op| match op {
            GitOp::CurrentBranch => fail(128, "fatal: not a git repository"),
            _ => ok(""),
        });
        let m = manifest(&[("api", "api", "main")]);

        let err = push(
            &env.executor(&backend),
            &select(&m, None).unwrap(),
            &BatchOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, SyncError::BranchUnresolved));
        assert!(pushes(&backend).is_empty());
    }

    #[test]
    fn detached_head_without_override_pushes_nothing() {
        let env = TestEnv::new();
        let backend = RecordingBackend::new(|op| match op {
            GitOp::CurrentBranch => ok("HEAD"),
            _ => ok(""),
        });
        let m = manifest(&[("api", "api", "main"), ("ui", "ui", "main")]);

        let err = push(
            &env.executor(&backend),
            &select(&m, None).unwrap(),
            &BatchOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, SyncError::BranchUnresolved));
        assert!(pushes(&backend).is_empty());
    }

    #[test]
    fn dry_run_with_unknown_branch_lists_commands_against_placeholder() {
        let env = TestEnv::new();
        let backend = RecordingBackend::new(|op| match op {
            GitOp::CurrentBranch => fail(128, "fatal: ambiguous argument 'HEAD'"),
            _ => fail(1, "must not run"),
        });
        let m = manifest(&[("api", "api", "main"), ("ui", "ui", "main")]);
        let options = BatchOptions {
            branch: None,
            dry_run: true,
        };

        let report = push(&env.executor(&backend), &select(&m, None).unwrap(), &options)
            .expect("dry run never fails on the branch");

        assert_eq!(report.results.len(), 2);
        assert!(report.results.iter().all(|r| r.outcome == Outcome::Ok));
        assert!(report.results.iter().all(|r| r.branch == UNRESOLVED_BRANCH));
        assert!(pushes(&backend).is_empty());

        let lines = env.audit_lines();
        assert!(lines.iter().any(|l| l.contains("[WARN] could not determine the umbrella's current branch")));
        assert!(lines.iter().any(|l| l.ends_with(
            "[DRY RUN] Would execute: git subtree push --prefix=ui ui-origin <current-branch>"
        )));
    }

    #[test]
    fn dry_run_writes_nothing_and_is_repeatable() {
        let env = TestEnv::new();
        let backend = RecordingBackend::new(|op| match op {
            GitOp::CurrentBranch => ok("main"),
            _ => fail(1, "must not run"),
        });
        let m = manifest(&[("api", "api", "main"), ("ui", "ui", "main")]);
        let options = BatchOptions {
            branch: None,
            dry_run: true,
        };
        let exec = env.executor(&backend);
        let selected = select(&m, None).unwrap();

        let first = push(&exec, &selected, &options).expect("first");
        let after_first = env.audit_lines().len();
        let second = push(&exec, &selected, &options).expect("second");

        assert_eq!(first, second);
        assert!(first.results.iter().all(|r| r.outcome == Outcome::Ok));
        assert!(pushes(&backend).is_empty());

        let lines: Vec<String> = env
            .audit_lines()
            .iter()
            .map(|l| without_timestamp(l).to_string())
            .collect();
        let (run1, run2) = lines.split_at(after_first);
        assert_eq!(run1, run2);
        assert!(run1.iter().any(|l| l == "[INFO] [DRY RUN] Would execute: git subtree push --prefix=api api-origin main"));
    }
}
