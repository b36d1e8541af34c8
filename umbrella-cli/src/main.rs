//! Umbrella: subtree sync between an umbrella repository and the source
//! repositories of its subdirectories.
//!
//! # Usage
//!
//! ```text
//! umbrella status [--prefix NAME] [--json]
//! umbrella sync   [--prefix NAME] [--branch NAME] [--dry-run]
//! umbrella pull   [--prefix NAME] [--branch NAME] [--dry-run]
//! umbrella --help
//! ```

mod commands;
mod lenient;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};

use commands::{pull::PullArgs, status::StatusArgs, sync::SyncArgs, Session};
use lenient::Scanned;
use umbrella_core::manifest;
use umbrella_sync::AuditLog;

const WORKFLOW: &str = "\
OVERVIEW:
  This repository is an umbrella that combines several source repositories
  as subtrees. Each subdirectory listed in .subtrees.json maps to its own
  repository. Changes flow through the umbrella and are synced back.

WORKFLOW:
  1. Edit files in the umbrella, commit, push.
  2. Run: umbrella sync
     -> pushes each subtree to a branch on its source repository.
  3. Open PRs on the source repositories and merge them.
  4. Run: umbrella pull
     -> squash-merges the merged state back into the umbrella.

NOTES:
  Options may appear in any order. Unrecognized options are ignored.
  Every action is appended to logs/subtree-YYYY-MM-DD.log (UTC).
  The umbrella root is --root, else $UMBRELLA_ROOT, else the nearest
  directory containing .subtrees.json.";

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "umbrella",
    version,
    about = "Sync an umbrella repository with the source repositories of its subtrees",
    long_about = None,
    after_long_help = WORKFLOW,
    disable_help_subcommand = true,
)]
struct Cli {
    /// Umbrella repository root.
    #[arg(long, global = true, value_name = "PATH")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show source, branch, file count and change state of each subtree.
    Status(StatusArgs),

    /// Push changes from this umbrella to the source repositories.
    Sync(SyncArgs),

    /// Pull changes from the source repositories into this umbrella.
    Pull(PullArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    match lenient::scan(&raw) {
        Scanned::Usage => print_help(None, false),
        Scanned::Help { command } => print_help(command.as_deref(), true),
        Scanned::Version => {
            print!("{}", Cli::command().render_version());
            ExitCode::SUCCESS
        }
        Scanned::Invoke {
            command,
            argv,
            root,
        } => invoke(&command, argv, root),
    }
}

fn invoke(command: &str, argv: Vec<String>, root: Option<PathBuf>) -> ExitCode {
    let root = match resolve_root(root) {
        Ok(root) => root,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    let log = audit_log(&root);

    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) => {
            log::debug!("clap rejected invocation: {err}");
            log.error(format!("Unknown command: {command}. Use --help for usage."));
            return ExitCode::FAILURE;
        }
    };
    log::debug!(
        "umbrella root: {} (audit file: {})",
        root.display(),
        log.persists()
    );

    let session = Session { root, log };
    let result = match cli.command {
        Commands::Status(args) => args.run(&session),
        Commands::Sync(args) => args.run(&session),
        Commands::Pull(args) => args.run(&session),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            session.log.error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

/// `--root`, else `$UMBRELLA_ROOT`, else discovered from the working directory.
fn resolve_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = explicit.or_else(|| std::env::var_os("UMBRELLA_ROOT").map(PathBuf::from)) {
        return Ok(root);
    }
    let cwd = std::env::current_dir().context("could not determine working directory")?;
    Ok(manifest::discover_root(&cwd))
}

/// Audit into `<root>/logs/` only when `root` is an umbrella; otherwise echo
/// to the console so a stray invocation leaves no files behind.
fn audit_log(root: &Path) -> AuditLog {
    if manifest::manifest_path_at(root).is_file() {
        AuditLog::for_root(root)
    } else {
        AuditLog::console_only(root.join(umbrella_sync::audit::LOG_DIR))
    }
}

fn print_help(command: Option<&str>, long: bool) -> ExitCode {
    let mut cli = Cli::command();
    cli.build();
    let sub = command.and_then(|name| cli.find_subcommand(name).cloned());
    let printed = match sub {
        Some(mut sub) => sub.print_long_help(),
        None if long => cli.print_long_help(),
        None => cli.print_help(),
    };
    if let Err(err) = printed {
        log::warn!("could not print help: {err}");
    }
    ExitCode::SUCCESS
}
