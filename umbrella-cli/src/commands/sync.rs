//! `umbrella sync`: push each subtree to its source repository.

use anyhow::Result;
use clap::Args;
use umbrella_sync::pipeline::Action;

use super::{BatchArgs, Session};

/// Arguments for `umbrella sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub batch: BatchArgs,
}

impl SyncArgs {
    pub fn run(self, session: &Session) -> Result<()> {
        let action = Action::Push(self.batch.options());
        let report = session.run(self.batch.prefix.as_deref(), action)?;
        println!("{report}");
        Ok(())
    }
}
