//! Shared machinery for push and pull batches.
//!
//! A batch walks the working set in manifest order, runs one subtree command
//! per entry and records `OK`/`FAILED`. A failure is logged and recorded, and
//! the batch moves on: no entry can abort or undo another.

use std::fmt;

use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use umbrella_core::{Subtree, SubtreeName};

use crate::exec::{Executor, GitOp};

/// Per-subtree outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Ok,
    Failed,
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "OK",
            Outcome::Failed => "FAILED",
        }
    }

    fn marker(&self) -> &'static str {
        match self {
            Outcome::Ok => "[+]",
            Outcome::Failed => "[X]",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way history flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Umbrella → source repositories.
    Push,
    /// Source repositories → umbrella.
    Pull,
}

impl Direction {
    fn verb(&self) -> &'static str {
        match self {
            Direction::Push => "sync",
            Direction::Pull => "pull",
        }
    }

    fn gerund(&self) -> &'static str {
        match self {
            Direction::Push => "Syncing",
            Direction::Pull => "Pulling",
        }
    }

    fn past(&self) -> &'static str {
        match self {
            Direction::Push => "synced",
            Direction::Pull => "pulled",
        }
    }

    fn arrow(&self) -> &'static str {
        match self {
            Direction::Push => "->",
            Direction::Pull => "<-",
        }
    }
}

/// Options shared by `sync` and `pull`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Explicit target branch; wins over any default.
    pub branch: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtreeResult {
    pub name: SubtreeName,
    /// Branch the command targeted.
    pub branch: String,
    pub outcome: Outcome,
}

/// Everything a finished batch reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub direction: Direction,
    pub dry_run: bool,
    /// Umbrella-wide target branch (push only).
    pub target_branch: Option<String>,
    pub results: Vec<SubtreeResult>,
}

impl BatchReport {
    pub fn outcome_of(&self, name: &str) -> Option<Outcome> {
        self.results
            .iter()
            .find(|r| r.name.0 == name)
            .map(|r| r.outcome)
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.outcome.is_ok()).count()
    }

    pub fn succeeded(&self) -> usize {
        self.results.len() - self.failed()
    }

    fn reminders(&self) -> String {
        let rule = format!("  {}", "=".repeat(60));
        let body = match self.direction {
            Direction::Push => {
                let branch = self.target_branch.as_deref().unwrap_or("(unknown)");
                format!(
                    "  - Source repos now have branch '{branch}' with your changes.\n\
                     \x20 - Open PRs on each source repo to merge into their main branch.\n\
                     \x20 - After merging PRs, run: umbrella pull\n\
                     \x20   to sync the merged state back into this umbrella repo.\n\
                     \x20 - Do NOT forget the pull step, or umbrella main will drift."
                )
            }
            Direction::Pull => "  - Review the pulled changes with: git log --oneline -5\n\
                 \x20 - If there are merge conflicts, resolve them before continuing.\n\
                 \x20 - Push the umbrella after pulling: git push"
                .to_string(),
        };
        format!("{rule}\n  REMINDERS:\n{body}\n{rule}")
    }
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "")]
    marker: String,
    #[tabled(rename = "subtree")]
    name: String,
    #[tabled(rename = "branch")]
    branch: String,
    #[tabled(rename = "result")]
    result: String,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "  {} RESULTS:", self.direction.verb().to_uppercase())?;
        if self.results.is_empty() {
            writeln!(f, "    (no subtrees selected)")?;
        } else {
            let rows: Vec<ResultRow> = self
                .results
                .iter()
                .map(|r| ResultRow {
                    marker: r.outcome.marker().to_string(),
                    name: r.name.0.clone(),
                    branch: r.branch.clone(),
                    result: r.outcome.to_string(),
                })
                .collect();
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            writeln!(f, "{table}")?;
            let failed = format!("{} failed", self.failed());
            let failed = if self.failed() > 0 {
                failed.red().bold().to_string()
            } else {
                failed
            };
            writeln!(f, "  {} ok, {failed}", self.succeeded().to_string().green())?;
        }
        writeln!(f, "{rule}")?;
        writeln!(f)?;
        write!(f, "{}", self.reminders())
    }
}

/// Print the opening banner of a batch.
pub(crate) fn print_header(title: &str, lines: &[String], dry_run: bool) {
    let rule = "=".repeat(60);
    println!();
    println!("{rule}");
    println!("  {title}");
    for line in lines {
        println!("  {line}");
    }
    if dry_run {
        println!("  *** DRY RUN -- no changes will be made ***");
    }
    println!("{rule}");
    println!();
}

/// Run one command per subtree, continuing past failures.
///
/// `branch_for` picks the target branch of each entry and `op_for` builds
/// the command from the entry and that branch.
pub(crate) fn run_batch(
    exec: &Executor<'_>,
    direction: Direction,
    subtrees: &[&Subtree],
    dry_run: bool,
    branch_for: impl Fn(&Subtree) -> String,
    op_for: impl Fn(&Subtree, &str) -> GitOp,
) -> Vec<SubtreeResult> {
    let log = exec.log();
    let mut results = Vec::with_capacity(subtrees.len());

    for subtree in subtrees {
        let name = &subtree.name;
        let branch = branch_for(subtree);
        log.info(format!(
            "{} '{name}' {} {} (branch: {branch})",
            direction.gerund(),
            direction.arrow(),
            subtree.spec.remote_url,
        ));

        let outcome = match exec.run(&op_for(subtree, &branch), dry_run) {
            Ok(out) if out.success() => {
                log.info(format!("Successfully {} '{name}'.", direction.past()));
                Outcome::Ok
            }
            Ok(out) => {
                tracing::debug!("'{name}' exited with status {}", out.status);
                log.error(format!(
                    "FAILED to {} '{name}'. Check output above.",
                    direction.verb()
                ));
                Outcome::Failed
            }
            Err(err) => {
                log.error(format!("FAILED to {} '{name}': {err}", direction.verb()));
                Outcome::Failed
            }
        };
        println!();

        results.push(SubtreeResult {
            name: name.clone(),
            branch,
            outcome,
        });
    }

    results
}
