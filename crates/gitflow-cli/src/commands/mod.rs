//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

pub mod completions;
pub mod feature;
pub mod hotfix;
pub mod init;
pub mod release;
pub mod utils;

/// git-flow branching workflows: features, releases and hotfixes.
#[derive(Parser)]
#[command(name = "gitflow", version, about, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Run as if started in <DIR>.
    #[arg(short = 'C', global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Suppress informational output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print the result as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Never prompt: answer yes to confirmations and stop at conflicts.
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Validate and print the plan without running it.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    pub fn globals(&self) -> Globals {
        Globals {
            directory: self.directory.clone(),
            json: self.json,
            yes: self.yes,
            dry_run: self.dry_run,
        }
    }
}

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    pub directory: Option<PathBuf>,
    pub json: bool,
    pub yes: bool,
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up git-flow branches and configuration in this repository.
    Init(InitArgs),

    /// Manage feature branches.
    #[command(subcommand)]
    Feature(FeatureCommand),

    /// Manage release branches.
    #[command(subcommand)]
    Release(ReleaseCommand),

    /// Manage hotfix branches.
    #[command(subcommand)]
    Hotfix(HotfixCommand),

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// Accept defaults for everything not given on the command line.
    #[arg(short, long)]
    pub defaults: bool,

    /// Reconfigure a repository that is already initialized.
    #[arg(short, long)]
    pub force: bool,

    /// Branch for production releases.
    #[arg(long, value_name = "BRANCH")]
    pub main: Option<String>,

    /// Branch for integrating the next release.
    #[arg(long, value_name = "BRANCH")]
    pub develop: Option<String>,

    #[arg(long, value_name = "PREFIX")]
    pub feature_prefix: Option<String>,

    #[arg(long, value_name = "PREFIX")]
    pub release_prefix: Option<String>,

    #[arg(long, value_name = "PREFIX")]
    pub hotfix_prefix: Option<String>,

    #[arg(long, value_name = "PREFIX")]
    pub support_prefix: Option<String>,

    /// Prefix for version tags, e.g. `v`.
    #[arg(long, value_name = "PREFIX")]
    pub tag_prefix: Option<String>,
}

#[derive(Subcommand)]
pub enum FeatureCommand {
    /// Start a feature branch from develop.
    Start {
        /// Feature name.
        name: String,
    },
    /// Rebase a feature branch onto develop.
    Rebase {
        /// Feature name (defaults to the current branch).
        name: Option<String>,
    },
    /// Merge a feature into develop and delete it.
    Finish {
        /// Feature name (defaults to the current branch).
        name: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ReleaseCommand {
    /// Start a release branch from develop.
    Start {
        /// Release version.
        #[arg(value_name = "VERSION")]
        name: String,
    },
    /// Merge a release into main and develop, tag it and delete it.
    Finish(FinishArgs),
}

#[derive(Subcommand)]
pub enum HotfixCommand {
    /// Start a hotfix branch from main.
    Start {
        /// Hotfix version.
        #[arg(value_name = "VERSION")]
        name: String,
    },
    /// Merge a hotfix into main and develop, tag it and delete it.
    Finish(FinishArgs),
}

#[derive(Args, Debug, Default)]
pub struct FinishArgs {
    /// Version to finish (defaults to the current branch).
    #[arg(value_name = "VERSION")]
    pub name: Option<String>,

    /// Tag message.
    #[arg(short, long)]
    pub message: Option<String>,

    /// Push main, develop and tags afterwards.
    #[arg(short, long, conflicts_with = "no_push")]
    pub push: bool,

    /// Do not push, even if `flow.push_on_finish` is set.
    #[arg(long)]
    pub no_push: bool,
}
