//! Scripted git backend and fixtures shared by unit tests.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use umbrella_core::{Manifest, Subtree, SubtreeName, SubtreeSpec};

use crate::audit::AuditLog;
use crate::error::SyncError;
use crate::exec::{Executor, GitBackend, GitOp, ProcessOutput};

type Script = Box<dyn Fn(&GitOp) -> Result<ProcessOutput, SyncError>>;

/// Records every operation it is asked to run and answers from a script.
pub struct RecordingBackend {
    script: Script,
    calls: RefCell<Vec<GitOp>>,
    timeouts: RefCell<Vec<Duration>>,
}

impl RecordingBackend {
    pub fn new(script: impl Fn(&GitOp) -> Result<ProcessOutput, SyncError> + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: RefCell::new(Vec::new()),
            timeouts: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<GitOp> {
        self.calls.borrow().clone()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.timeouts.borrow().clone()
    }
}

impl GitBackend for RecordingBackend {
    fn execute(
        &self,
        _root: &Path,
        op: &GitOp,
        timeout: Duration,
    ) -> Result<ProcessOutput, SyncError> {
        self.calls.borrow_mut().push(op.clone());
        self.timeouts.borrow_mut().push(timeout);
        (self.script)(op)
    }
}

pub fn ok(stdout: &str) -> Result<ProcessOutput, SyncError> {
    Ok(ProcessOutput {
        status: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    })
}

pub fn fail(status: i32, stderr: &str) -> Result<ProcessOutput, SyncError> {
    Ok(ProcessOutput {
        status,
        stdout: String::new(),
        stderr: stderr.to_string(),
    })
}

/// Temporary umbrella root with a silent audit log under `logs/`.
pub struct TestEnv {
    pub root: TempDir,
    pub log: AuditLog,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = TempDir::new().expect("tempdir");
        let log = AuditLog::silent(root.path().join("logs"));
        Self { root, log }
    }

    pub fn executor<'a>(&'a self, backend: &'a dyn GitBackend) -> Executor<'a> {
        Executor::new(backend, self.root.path(), &self.log)
    }

    pub fn mkdir(&self, prefix: &str) {
        fs::create_dir_all(self.root.path().join(prefix)).expect("mkdir prefix");
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir parent");
        }
        fs::write(path, contents).expect("write file");
    }

    /// Every audit line written so far, across all daily files.
    pub fn audit_lines(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.log.dir()) else {
            return Vec::new();
        };
        let mut files: Vec<_> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        files.sort();
        files
            .iter()
            .flat_map(|path| {
                fs::read_to_string(path)
                    .expect("read audit file")
                    .lines()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

/// Manifest from `(name, prefix, upstream_branch)` triples.
pub fn manifest(entries: &[(&str, &str, &str)]) -> Manifest {
    Manifest {
        subtrees: entries
            .iter()
            .map(|(name, prefix, branch)| Subtree {
                name: SubtreeName::from(*name),
                spec: SubtreeSpec {
                    prefix: prefix.to_string(),
                    remote_name: format!("{name}-origin"),
                    remote_url: format!("git@example.com:org/{name}.git"),
                    upstream_branch: branch.to_string(),
                },
            })
            .collect(),
    }
}

/// Strip the `[timestamp] ` prefix so lines from separate runs compare equal.
pub fn without_timestamp(line: &str) -> &str {
    line.split_once("] ").map(|(_, rest)| rest).unwrap_or(line)
}
