//! `gitflow release` commands.

use anyhow::Result;
use gitflow_core::WorkflowAction;

use super::utils::{self, Session, quoted};
use super::{FinishArgs, Globals};
use crate::output;

/// Start a release branch off develop.
pub fn start(globals: &Globals, version: &str) -> Result<()> {
    utils::block_on(async {
        let session = Session::open(globals).await?;
        let action = WorkflowAction::ReleaseStart(version.to_string());

        if session.execute(&action).await?.is_some() {
            output::success(&format!("Started release '{version}'"));
            output::info("Bump the version and fix bugs here, then run `gitflow release finish`");
        }
        Ok(())
    })
}

/// Merge a release into main and develop, tag it and delete it.
pub fn finish(globals: &Globals, args: &FinishArgs) -> Result<()> {
    utils::block_on(async {
        let session = Session::open(globals).await?;
        let options = session.finish_options(args);
        let action = WorkflowAction::ReleaseFinish(options);

        if session.execute(&action).await?.is_some() {
            output::success(&format!(
                "Finished release{}",
                quoted(args.name.as_deref())
            ));
        }
        Ok(())
    })
}
