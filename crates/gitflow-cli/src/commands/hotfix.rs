//! `gitflow hotfix` commands.

use anyhow::Result;
use gitflow_core::WorkflowAction;

use super::utils::{self, Session, quoted};
use super::{FinishArgs, Globals};
use crate::output;

/// Start a hotfix branch off main.
pub fn start(globals: &Globals, version: &str) -> Result<()> {
    utils::block_on(async {
        let session = Session::open(globals).await?;
        let action = WorkflowAction::HotfixStart(version.to_string());

        if session.execute(&action).await?.is_some() {
            output::success(&format!("Started hotfix '{version}'"));
            output::info("Commit the fix here, then run `gitflow hotfix finish`");
        }
        Ok(())
    })
}

/// Merge a hotfix into main and develop, tag it and delete it.
pub fn finish(globals: &Globals, args: &FinishArgs) -> Result<()> {
    utils::block_on(async {
        let session = Session::open(globals).await?;
        let action = WorkflowAction::HotfixFinish(session.finish_options(args));

        if session.execute(&action).await?.is_some() {
            output::success(&format!("Finished hotfix{}", quoted(args.name.as_deref())));
        }
        Ok(())
    })
}
