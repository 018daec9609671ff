//! `gitflow feature` commands.

use anyhow::Result;
use gitflow_core::WorkflowAction;

use super::Globals;
use super::utils::{self, Session, quoted};
use crate::output;

/// Start a feature branch off develop.
pub fn start(globals: &Globals, name: &str) -> Result<()> {
    utils::block_on(async {
        let session = Session::open(globals).await?;
        let action = WorkflowAction::FeatureStart(name.to_string());

        if session.execute(&action).await?.is_some() {
            output::success(&format!("Started feature '{name}'"));
            output::info("When done, run `gitflow feature finish`");
        }
        Ok(())
    })
}

/// Rebase a feature branch onto develop.
pub fn rebase(globals: &Globals, name: Option<String>) -> Result<()> {
    utils::block_on(async {
        let session = Session::open(globals).await?;
        let label = quoted(name.as_deref());
        let action = WorkflowAction::FeatureRebase(name);

        if session.execute(&action).await?.is_some() {
            output::success(&format!("Rebased feature{label}"));
        }
        Ok(())
    })
}

/// Merge a feature into develop and delete it.
pub fn finish(globals: &Globals, name: Option<String>) -> Result<()> {
    utils::block_on(async {
        let session = Session::open(globals).await?;
        let label = quoted(name.as_deref());
        let action = WorkflowAction::FeatureFinish(name);

        if session.execute(&action).await?.is_some() {
            output::success(&format!("Finished feature{label}"));
        }
        Ok(())
    })
}
