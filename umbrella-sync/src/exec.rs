//! Git command execution.
//!
//! [`GitOp`] is the closed set of operations the orchestrator needs.
//! [`GitBackend`] runs one of them out of process; [`SystemGit`] is the real
//! implementation. [`Executor`] layers dry-run, capture and console echo on
//! top of any backend and is what the operations drive.

use std::ffi::OsString;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::audit::AuditLog;
use crate::error::SyncError;

/// Upper bound for any single git invocation.
pub const GIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Echoed stdout longer than this is truncated.
pub const ECHO_MAX_LINES: usize = 30;
const ECHO_HEAD_LINES: usize = 15;
const ECHO_TAIL_LINES: usize = 5;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// What `git rev-parse --abbrev-ref HEAD` prints when no branch is checked out.
const DETACHED_HEAD: &str = "HEAD";

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// A git operation against the umbrella working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitOp {
    /// `git rev-parse --abbrev-ref HEAD`
    CurrentBranch,
    /// `git diff --stat -- <prefix>/`
    DiffStat { prefix: String },
    /// `git diff --cached --stat -- <prefix>/`
    StagedDiffStat { prefix: String },
    /// `git subtree push --prefix=<prefix> <remote> <branch>`
    SubtreePush {
        prefix: String,
        remote: String,
        branch: String,
    },
    /// `git subtree pull --prefix=<prefix> <remote> <branch> [--squash]`
    SubtreePull {
        prefix: String,
        remote: String,
        branch: String,
        squash: bool,
    },
}

impl GitOp {
    /// Arguments passed to the `git` executable.
    pub fn args(&self) -> Vec<String> {
        match self {
            GitOp::CurrentBranch => vec!["rev-parse".into(), "--abbrev-ref".into(), "HEAD".into()],
            GitOp::DiffStat { prefix } => vec![
                "diff".into(),
                "--stat".into(),
                "--".into(),
                format!("{prefix}/"),
            ],
            GitOp::StagedDiffStat { prefix } => vec![
                "diff".into(),
                "--cached".into(),
                "--stat".into(),
                "--".into(),
                format!("{prefix}/"),
            ],
            GitOp::SubtreePush {
                prefix,
                remote,
                branch,
            } => vec![
                "subtree".into(),
                "push".into(),
                format!("--prefix={prefix}"),
                remote.clone(),
                branch.clone(),
            ],
            GitOp::SubtreePull {
                prefix,
                remote,
                branch,
                squash,
            } => {
                let mut args = vec![
                    "subtree".into(),
                    "pull".into(),
                    format!("--prefix={prefix}"),
                    remote.clone(),
                    branch.clone(),
                ];
                if *squash {
                    args.push("--squash".into());
                }
                args
            }
        }
    }

    /// Whether the operation changes a repository.
    pub fn mutates(&self) -> bool {
        matches!(self, GitOp::SubtreePush { .. } | GitOp::SubtreePull { .. })
    }
}

impl fmt::Display for GitOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "git {}", self.args().join(" "))
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Raw result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `-1` when the process was ended by a signal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

/// What the executor hands back to operations: status plus trimmed stdout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Runs one [`GitOp`] in `root` and waits at most `timeout` for it.
pub trait GitBackend {
    fn execute(
        &self,
        root: &Path,
        op: &GitOp,
        timeout: Duration,
    ) -> Result<ProcessOutput, SyncError>;
}

/// The `git` executable found on `PATH`.
#[derive(Debug, Clone)]
pub struct SystemGit {
    program: OsString,
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemGit {
    pub fn new() -> Self {
        Self {
            program: "git".into(),
        }
    }

    /// Use a specific git binary.
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl GitBackend for SystemGit {
    fn execute(
        &self,
        root: &Path,
        op: &GitOp,
        timeout: Duration,
    ) -> Result<ProcessOutput, SyncError> {
        let command = op.to_string();
        let mut child = Command::new(&self.program)
            .args(op.args())
            .current_dir(root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SyncError::Spawn {
                command: command.clone(),
                source,
            })?;

        // Pipes are drained concurrently so a chatty command cannot fill one
        // and stall before exiting.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SyncError::Timeout {
                        command,
                        timeout_secs: timeout.as_secs(),
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => return Err(SyncError::Wait { command, source }),
            }
        };

        Ok(ProcessOutput {
            status: status.code().unwrap_or(-1),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Drives a [`GitBackend`] on behalf of status, push and pull.
pub struct Executor<'a> {
    backend: &'a dyn GitBackend,
    root: &'a Path,
    log: &'a AuditLog,
    timeout: Duration,
}

impl<'a> Executor<'a> {
    pub fn new(backend: &'a dyn GitBackend, root: &'a Path, log: &'a AuditLog) -> Self {
        Self {
            backend,
            root,
            log,
            timeout: GIT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        self.root
    }

    pub fn log(&self) -> &AuditLog {
        self.log
    }

    /// Run `op`, logging the command line and echoing its output.
    ///
    /// In dry-run mode nothing is executed: the command line is logged and a
    /// zero status with empty output is returned. A non-zero exit is returned
    /// as data; `Err` means the command could not run or timed out.
    pub fn run(&self, op: &GitOp, dry_run: bool) -> Result<CommandOutput, SyncError> {
        if dry_run {
            self.log.info(format!("[DRY RUN] Would execute: {op}"));
            return Ok(CommandOutput::default());
        }

        self.log.info(format!("Executing: {op}"));
        let output = self.backend.execute(self.root, op, self.timeout)?;
        let stdout = output.stdout.trim().to_string();

        for line in echo_lines(&stdout) {
            println!("{line}");
        }
        if output.status != 0 {
            for line in output.stderr.trim().lines() {
                println!("  [stderr] {line}");
            }
        }

        Ok(CommandOutput {
            status: output.status,
            stdout,
        })
    }

    /// Run `op` quietly and return its trimmed stdout. Always executes.
    pub fn capture(&self, op: &GitOp) -> Result<CommandOutput, SyncError> {
        tracing::debug!("capturing: {op}");
        let output = self.backend.execute(self.root, op, self.timeout)?;
        Ok(CommandOutput {
            status: output.status,
            stdout: output.stdout.trim().to_string(),
        })
    }

    /// The umbrella's checked-out branch, if git can tell.
    ///
    /// A detached HEAD has no branch: git answers with the literal `HEAD`,
    /// which is reported as `None`.
    pub fn current_branch(&self) -> Option<String> {
        match self.capture(&GitOp::CurrentBranch) {
            Ok(out) if out.success() && out.stdout == DETACHED_HEAD => {
                tracing::debug!("umbrella is on a detached HEAD");
                None
            }
            Ok(out) if out.success() && !out.stdout.is_empty() => Some(out.stdout),
            Ok(out) => {
                tracing::debug!("current branch lookup exited with {}", out.status);
                None
            }
            Err(err) => {
                self.log.warn(format!("could not read current branch: {err}"));
                None
            }
        }
    }
}

/// Console lines for a command's stdout, indented, with long output cut to
/// the first 15 and last 5 lines.
pub fn echo_lines(stdout: &str) -> Vec<String> {
    if stdout.is_empty() {
        return Vec::new();
    }
    let lines: Vec<&str> = stdout.lines().collect();
    if lines.len() <= ECHO_MAX_LINES {
        return lines.iter().map(|l| format!("  {l}")).collect();
    }

    let total = lines.len();
    let mut out = Vec::with_capacity(ECHO_HEAD_LINES + ECHO_TAIL_LINES + 2);
    out.push(format!(
        "  (showing first {ECHO_HEAD_LINES} and last {ECHO_TAIL_LINES} of {total} lines)"
    ));
    out.extend(lines[..ECHO_HEAD_LINES].iter().map(|l| format!("  {l}")));
    out.push(format!(
        "  ... ({} lines omitted) ...",
        total - ECHO_HEAD_LINES - ECHO_TAIL_LINES
    ));
    out.extend(lines[total - ECHO_TAIL_LINES..].iter().map(|l| format!("  {l}")));
    out
}

// ─── Tests ────────────────────────────────────────────────────────────────────
