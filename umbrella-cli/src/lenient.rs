//! Tolerant pre-pass over the raw command line.
//!
//! Options are recognised wherever they appear and anything unrecognised is
//! dropped, so newer scripts keep working against older binaries. The output
//! is a canonical argv that clap then parses strictly.

use std::path::PathBuf;

/// Options that take the following token as their value.
const VALUE_OPTIONS: &[&str] = &["--prefix", "--branch", "--root"];
/// Options that are plain switches.
const SWITCHES: &[&str] = &["--dry-run", "--json"];

/// Result of scanning the raw arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scanned {
    /// No command given.
    Usage,
    /// `--help`, `-h` or `help`; carries the command it was asked about.
    Help { command: Option<String> },
    /// `--version` or `-V`.
    Version,
    /// A command to hand to clap.
    Invoke {
        command: String,
        argv: Vec<String>,
        root: Option<PathBuf>,
    },
}

#[derive(Debug, Default)]
struct Options {
    prefix: Option<String>,
    branch: Option<String>,
    root: Option<String>,
    dry_run: bool,
    json: bool,
}

impl Options {
    fn set_value(&mut self, name: &str, value: &str) {
        let slot = match name {
            "--prefix" => &mut self.prefix,
            "--branch" => &mut self.branch,
            "--root" => &mut self.root,
            _ => return,
        };
        *slot = Some(value.to_string());
    }

    fn set_switch(&mut self, name: &str) {
        match name {
            "--dry-run" => self.dry_run = true,
            "--json" => self.json = true,
            _ => {}
        }
    }
}

/// Scan `raw` (program name excluded).
///
/// The command is the first token that is neither a known option nor the
/// value of one, so global options such as `--root` may come first. Every
/// other position is checked for a known option; a value option consumes the
/// next token as its value but that token is still inspected on its own, and
/// the last occurrence wins.
pub fn scan(raw: &[String]) -> Scanned {
    let position = command_position(raw);
    let command = position.map(|i| raw[i].clone());

    if raw.iter().any(|a| a == "--help" || a == "-h") {
        return Scanned::Help { command };
    }
    if raw.iter().any(|a| a == "--version" || a == "-V") {
        return Scanned::Version;
    }
    let (Some(position), Some(command)) = (position, command) else {
        return Scanned::Usage;
    };
    if command == "help" {
        let rest = &raw[position + 1..];
        let topic = command_position(rest).map(|i| rest[i].clone());
        return Scanned::Help { command: topic };
    }

    let mut options = Options::default();
    for (i, arg) in raw.iter().enumerate() {
        if i == position {
            continue;
        }
        if let Some((name, value)) = arg.split_once('=') {
            if VALUE_OPTIONS.contains(&name) {
                options.set_value(name, value);
            }
            continue;
        }
        if VALUE_OPTIONS.contains(&arg.as_str()) {
            if let Some(value) = raw.get(i + 1) {
                options.set_value(arg, value);
            }
        } else if SWITCHES.contains(&arg.as_str()) {
            options.set_switch(arg);
        } else {
            note_ignored(arg);
        }
    }

    let mut argv = vec!["umbrella".to_string(), command.clone()];
    if let Some(root) = &options.root {
        argv.extend(["--root".to_string(), root.clone()]);
    }
    if let Some(prefix) = &options.prefix {
        argv.extend(["--prefix".to_string(), prefix.clone()]);
    }
    match command.as_str() {
        "status" => {
            if options.json {
                argv.push("--json".to_string());
            }
        }
        "sync" | "pull" => {
            if let Some(branch) = &options.branch {
                argv.extend(["--branch".to_string(), branch.clone()]);
            }
            if options.dry_run {
                argv.push("--dry-run".to_string());
            }
        }
        _ => {}
    }

    Scanned::Invoke {
        command: command.clone(),
        argv,
        root: options.root.map(PathBuf::from),
    }
}

/// Index of the command token, skipping options and option values.
fn command_position(raw: &[String]) -> Option<usize> {
    let mut i = 0;
    while i < raw.len() {
        let arg = raw[i].as_str();
        if VALUE_OPTIONS.contains(&arg) {
            i += 2;
        } else if arg.starts_with('-') {
            i += 1;
        } else {
            return Some(i);
        }
    }
    None
}

fn note_ignored(arg: &str) {
    if arg.starts_with('-') {
        log::debug!("ignoring unrecognized option {arg}");
    }
}
