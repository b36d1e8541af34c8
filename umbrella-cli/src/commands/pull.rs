//! `umbrella pull`: squash-merge each source repository back into its subtree.

use anyhow::Result;
use clap::Args;
use umbrella_sync::pipeline::Action;

use super::{BatchArgs, Session};

/// Arguments for `umbrella pull`.
#[derive(Args, Debug)]
pub struct PullArgs {
    #[command(flatten)]
    pub batch: BatchArgs,
}

impl PullArgs {
    pub fn run(self, session: &Session) -> Result<()> {
        let action = Action::Pull(self.batch.options());
        let report = session.run(self.batch.prefix.as_deref(), action)?;
        println!("{report}");
        Ok(())
    }
}
