use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use gitflow_core::{
    ConfigReader, Engine, Error, FinishOptions, Plan, Report, Settings, WorkflowAction,
};
use gitflow_git::{GitCli, GitTool};
use serde::Serialize;

use super::{FinishArgs, Globals};
use crate::output;
use crate::prompt::InquirePrompter;

/// Run a command body on a current-thread runtime.
pub fn block_on<T>(future: impl Future<Output = Result<T>>) -> Result<T> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    rt.block_on(future)
}

/// Everything a command needs to talk to the repository.
pub struct Session {
    engine: Engine<GitCli>,
    settings: Settings,
    prompter: InquirePrompter,
    json: bool,
    dry_run: bool,
}

impl Session {
    /// Load settings, find git and resolve the repository.
    pub async fn open(globals: &Globals) -> Result<Self> {
        let settings = Settings::load_default()?;

        let tool = GitTool::discover(settings.get("git.path").as_deref()).await?;
        let mut runner = GitCli::new(tool);
        if let Some(secs) = settings.git.timeout_secs {
            runner = runner.with_timeout(Duration::from_secs(secs));
        }

        let start = match &globals.directory {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Cannot determine current directory")?,
        };
        let workdir = runner
            .toplevel(&start)
            .await
            .context("Not inside a git repository")?;
        tracing::debug!(workdir = %workdir.display(), "opened repository");

        let engine = Engine::new(runner, workdir).with_remote(settings.flow.remote.clone());

        Ok(Self {
            engine,
            settings,
            prompter: InquirePrompter::from_env(globals.yes),
            json: globals.json,
            dry_run: globals.dry_run,
        })
    }

    pub const fn engine(&self) -> &Engine<GitCli> {
        &self.engine
    }

    pub const fn prompter(&self) -> &InquirePrompter {
        &self.prompter
    }

    /// Build finish options, applying `flow.push_on_finish` unless overridden.
    pub fn finish_options(&self, args: &FinishArgs) -> FinishOptions {
        FinishOptions {
            name: args.name.clone(),
            message: args.message.clone(),
            push: push_requested(args, self.settings.flow.push_on_finish),
        }
    }

    /// Run `action`, or print its plan under `--dry-run`.
    ///
    /// Returns the report of a completed action, `None` for a dry run.
    /// An aborted action is an error.
    pub async fn execute(&self, action: &WorkflowAction) -> Result<Option<Report>> {
        if self.dry_run {
            let plan = self.engine.plan(action).await?;
            if self.json {
                let output = DryRunOutput {
                    dry_run: true,
                    plan: &plan,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                output::plan(&plan);
            }
            return Ok(None);
        }

        let report = match self.engine.run(action, &self.prompter).await {
            Ok(report) => report,
            Err(e) => {
                if let Error::StepFailed { completed, .. } = &e {
                    output::completed_steps(completed);
                }
                return Err(e.into());
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            output::report(&report);
        }
        for note in &report.notes {
            output::warn(note);
        }

        if !report.succeeded() {
            bail!("{} did not complete", report.action);
        }
        Ok(Some(report))
    }
}

#[derive(Serialize)]
struct DryRunOutput<'a> {
    dry_run: bool,
    plan: &'a Plan,
}

const fn push_requested(args: &FinishArgs, push_on_finish: bool) -> bool {
    args.push || (push_on_finish && !args.no_push)
}

/// ` 'name'` for messages, empty when the current branch was used.
pub fn quoted(name: Option<&str>) -> String {
    name.map(|n| format!(" '{n}'")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_requested() {
        let mut args = FinishArgs::default();
        assert!(!push_requested(&args, false));
        assert!(push_requested(&args, true));

        args.no_push = true;
        assert!(!push_requested(&args, true));

        args.no_push = false;
        args.push = true;
        assert!(push_requested(&args, false));
    }

    #[test]
    fn test_quoted() {
        assert_eq!(quoted(Some("1.2.0")), " '1.2.0'");
        assert_eq!(quoted(None), "");
    }
}
