//! `umbrella status`: report the state of each subtree.

use anyhow::{bail, Context, Result};
use clap::Args;
use umbrella_sync::pipeline::{Action, Report};

use super::Session;

/// Arguments for `umbrella status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only report this subtree.
    #[arg(long, value_name = "NAME", allow_hyphen_values = true)]
    pub prefix: Option<String>,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, session: &Session) -> Result<()> {
        let report = match session.run(self.prefix.as_deref(), Action::Status)? {
            Report::Status(report) => report,
            Report::Batch(_) => bail!("status produced a batch report"),
        };

        if self.json {
            let json = serde_json::to_string_pretty(&report).context("could not encode status")?;
            println!("{json}");
        } else {
            println!("{report}");
        }
        Ok(())
    }
}
