//! `gitflow init` command - Set up git-flow in the current repository.

use anyhow::{Result, bail};
use gitflow_core::{FlowConfig, InitOptions, Prompter, RepositoryState, WorkflowAction};

use super::utils::{self, Session};
use super::{Globals, InitArgs};
use crate::output;

/// Run the init command.
pub fn run(globals: &Globals, args: &InitArgs) -> Result<()> {
    utils::block_on(async {
        let session = Session::open(globals).await?;
        let state = session.engine().state().await?;
        let prompter = session.prompter();

        let reinitialize = args.force
            || (state.config.is_some()
                && prompter.is_interactive()
                && prompter.confirm("gitflow is already initialized. Reconfigure it?", false));

        let config = if state.config.is_some() && !reinitialize {
            // Nothing will be written; the engine reports the existing setup.
            state.config.clone().unwrap_or_default()
        } else {
            let mut config = apply_args(suggested(&state), args);
            if prompter.is_interactive() && !args.defaults {
                config = ask(prompter, config, args)?;
            }
            config
        };

        let action = WorkflowAction::Initialize(InitOptions {
            config: config.clone(),
            reinitialize,
        });
        let Some(report) = session.execute(&action).await? else {
            return Ok(());
        };

        if !report.completed.is_empty() {
            output::success(&format!(
                "Initialized git-flow (main: '{}', develop: '{}')",
                config.main, config.develop
            ));
            output::info(&format!(
                "Start a feature with `gitflow feature start <name>`; features branch off '{}'",
                config.develop
            ));
        }
        Ok(())
    })
}

/// Starting point for a new configuration.
fn suggested(state: &RepositoryState) -> FlowConfig {
    if let Some(existing) = &state.config {
        return existing.clone();
    }
    FlowConfig {
        main: suggest_main(state),
        ..FlowConfig::default()
    }
}

/// An existing `master` or `main`, else whatever HEAD points at.
fn suggest_main(state: &RepositoryState) -> String {
    ["master", "main"]
        .into_iter()
        .find(|b| state.has_branch(b))
        .map(String::from)
        .or_else(|| state.current_branch.clone())
        .unwrap_or_else(|| FlowConfig::default().main)
}

fn apply_args(mut config: FlowConfig, args: &InitArgs) -> FlowConfig {
    let overrides = [
        (&mut config.main, &args.main),
        (&mut config.develop, &args.develop),
        (&mut config.feature_prefix, &args.feature_prefix),
        (&mut config.release_prefix, &args.release_prefix),
        (&mut config.hotfix_prefix, &args.hotfix_prefix),
        (&mut config.support_prefix, &args.support_prefix),
        (&mut config.version_tag_prefix, &args.tag_prefix),
    ];
    for (field, value) in overrides {
        if let Some(value) = value {
            field.clone_from(value);
        }
    }
    config
}

/// Ask for every value not given on the command line.
fn ask<P: Prompter>(prompter: &P, mut config: FlowConfig, args: &InitArgs) -> Result<FlowConfig> {
    let questions = [
        (&mut config.main, args.main.is_some(), "Branch for production releases:"),
        (&mut config.develop, args.develop.is_some(), "Branch for integrating the next release:"),
        (&mut config.feature_prefix, args.feature_prefix.is_some(), "Feature branch prefix:"),
        (&mut config.release_prefix, args.release_prefix.is_some(), "Release branch prefix:"),
        (&mut config.hotfix_prefix, args.hotfix_prefix.is_some(), "Hotfix branch prefix:"),
        (&mut config.support_prefix, args.support_prefix.is_some(), "Support branch prefix:"),
        (&mut config.version_tag_prefix, args.tag_prefix.is_some(), "Version tag prefix:"),
    ];
    for (field, given, prompt) in questions {
        if given {
            continue;
        }
        let Some(answer) = prompter.input_text(field.as_str(), prompt) else {
            bail!("Initialization cancelled");
        };
        *field = answer;
    }
    Ok(config)
}
