//! Per-subtree status inspection.
//!
//! Read-only. A failed diff check counts as "no changes found" so that one
//! broken check never hides the rest of the report.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use walkdir::WalkDir;

use umbrella_core::Subtree;

use crate::exec::{Executor, GitOp};

/// Classification of one subtree at report time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Clean,
    HasUncommittedChanges,
    HasStagedChanges,
    Missing,
}

impl StatusClass {
    pub fn label(&self) -> &'static str {
        match self {
            StatusClass::Clean => "Clean",
            StatusClass::HasUncommittedChanges => "HAS UNCOMMITTED CHANGES",
            StatusClass::HasStagedChanges => "HAS STAGED CHANGES",
            StatusClass::Missing => "MISSING (directory not found)",
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtreeStatus {
    pub name: String,
    pub prefix: String,
    pub remote_url: String,
    pub remote_name: String,
    pub upstream_branch: String,
    /// Regular files under the prefix; `None` when the directory is missing.
    pub files: Option<usize>,
    pub status: StatusClass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Umbrella's checked-out branch, if it could be read.
    pub branch: Option<String>,
    pub subtrees: Vec<SubtreeStatus>,
}

/// Inspect every subtree in order.
pub fn report(exec: &Executor<'_>, subtrees: &[&Subtree]) -> StatusReport {
    StatusReport {
        branch: exec.current_branch(),
        subtrees: subtrees.iter().map(|s| inspect(exec, s)).collect(),
    }
}

/// Inspect one subtree: existence, file count, then unstaged before staged.
pub fn inspect(exec: &Executor<'_>, subtree: &Subtree) -> SubtreeStatus {
    let spec = &subtree.spec;
    let prefix = spec.normalized_prefix().to_string();
    let path = spec.prefix_path(exec.root());

    let (files, status) = if !path.is_dir() {
        (None, StatusClass::Missing)
    } else {
        let files = count_files(&path);
        let status = if has_output(exec, &GitOp::DiffStat { prefix: prefix.clone() }) {
            StatusClass::HasUncommittedChanges
        } else if has_output(exec, &GitOp::StagedDiffStat { prefix: prefix.clone() }) {
            StatusClass::HasStagedChanges
        } else {
            StatusClass::Clean
        };
        (Some(files), status)
    };

    SubtreeStatus {
        name: subtree.name.0.clone(),
        prefix,
        remote_url: spec.remote_url.clone(),
        remote_name: spec.remote_name.clone(),
        upstream_branch: spec.upstream_branch.clone(),
        files,
        status,
    }
}

fn has_output(exec: &Executor<'_>, op: &GitOp) -> bool {
    match exec.capture(op) {
        Ok(out) => !out.stdout.is_empty(),
        Err(err) => {
            exec.log().warn(format!("status check failed, assuming no changes: {err}"));
            false
        }
    }
}

/// Count regular files below `path`, skipping unreadable entries.
pub fn count_files(path: &Path) -> usize {
    WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .count()
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "  UMBRELLA SUBTREE STATUS")?;
        writeln!(f, "  Branch: {}", self.branch.as_deref().unwrap_or("(unknown)"))?;
        writeln!(f, "{rule}")?;
        writeln!(f)?;

        for s in &self.subtrees {
            writeln!(f, "  [{}]", s.name)?;
            writeln!(f, "    Prefix:   {}/", s.prefix)?;
            writeln!(f, "    Source:   {}", s.remote_url)?;
            writeln!(f, "    Remote:   {}", s.remote_name)?;
            writeln!(f, "    Upstream: {}", s.upstream_branch)?;
            if let Some(files) = s.files {
                writeln!(f, "    Files:    {files}")?;
            }
            writeln!(f, "    Status:   {}", s.status)?;
            writeln!(f)?;
        }

        write!(f, "{rule}")
    }
}
