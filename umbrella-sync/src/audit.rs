//! Append-only audit log.
//!
//! Every line goes to the console and to `<dir>/subtree-YYYY-MM-DD.log`
//! (UTC date), formatted as `[YYYY-MM-DD HH:MM:SS UTC] [LEVEL] message`.
//! Files are opened in append mode for each line and never rotated or
//! truncated, so the file is the durable record of every invocation.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Directory under the umbrella root that holds audit files.
pub const LOG_DIR: &str = "logs";

/// Severity tag written into each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warn => write!(f, "WARN"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

/// Explicit logging context, built once per process and passed by reference.
#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: PathBuf,
    echo: bool,
    persist: bool,
}

impl AuditLog {
    /// Log into `dir`, echoing to the console.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            echo: true,
            persist: true,
        }
    }

    /// Log into `<root>/logs/`.
    pub fn for_root(root: &Path) -> Self {
        Self::new(root.join(LOG_DIR))
    }

    /// Log into `dir` without console echo.
    pub fn silent(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            echo: false,
            persist: true,
        }
    }

    /// Echo to the console only; nothing is written under `dir`.
    ///
    /// Used when the process is not running inside an umbrella.
    pub fn console_only(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            echo: true,
            persist: false,
        }
    }

    /// Whether lines are appended to the audit file.
    pub fn persists(&self) -> bool {
        self.persist
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/subtree-YYYY-MM-DD.log` for the UTC date of `now`.
    pub fn file_for(&self, now: DateTime<Utc>) -> PathBuf {
        self.dir
            .join(format!("subtree-{}.log", now.format("%Y-%m-%d")))
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(Level::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(Level::Warn, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(Level::Error, message.as_ref());
    }

    pub fn log(&self, level: Level, message: &str) {
        self.log_at(Utc::now(), level, message);
    }

    /// Write one line stamped with `now`.
    ///
    /// A failure to append is reported as a diagnostic warning; it never
    /// interrupts the operation being logged.
    pub fn log_at(&self, now: DateTime<Utc>, level: Level, message: &str) {
        let line = format_line(now, level, message);
        if self.echo {
            match level {
                Level::Info => println!("{line}"),
                Level::Warn | Level::Error => eprintln!("{line}"),
            }
        }

        if !self.persist {
            return;
        }
        let path = self.file_for(now);
        if let Err(err) = self.append(&path, &line) {
            tracing::warn!("could not append to audit log {}: {err}", path.display());
        }
    }

    fn append(&self, path: &Path, line: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")
    }
}

/// `[YYYY-MM-DD HH:MM:SS UTC] [LEVEL] message`
pub fn format_line(now: DateTime<Utc>, level: Level, message: &str) -> String {
    format!(
        "[{}] [{}] {}",
        now.format("%Y-%m-%d %H:%M:%S UTC"),
        level,
        message
    )
}

// ─── Tests ────────────────────────────────────────────────────────────────────
