//! gitflow CLI - feature, release and hotfix branching workflows for git.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;
mod prompt;

use commands::{Cli, Commands, FeatureCommand, HotfixCommand, ReleaseCommand};

/// Environment variable holding the log filter, e.g. `GITFLOW_LOG=debug`.
const LOG_ENV: &str = "GITFLOW_LOG";

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    output::set_quiet(cli.quiet || cli.json);

    let globals = cli.globals();
    let result = match cli.command {
        Commands::Init(args) => commands::init::run(&globals, &args),
        Commands::Feature(command) => match command {
            FeatureCommand::Start { name } => commands::feature::start(&globals, &name),
            FeatureCommand::Rebase { name } => commands::feature::rebase(&globals, name),
            FeatureCommand::Finish { name } => commands::feature::finish(&globals, name),
        },
        Commands::Release(command) => match command {
            ReleaseCommand::Start { name } => commands::release::start(&globals, &name),
            ReleaseCommand::Finish(args) => commands::release::finish(&globals, &args),
        },
        Commands::Hotfix(command) => match command {
            HotfixCommand::Start { name } => commands::hotfix::start(&globals, &name),
            HotfixCommand::Finish(args) => commands::hotfix::finish(&globals, &args),
        },
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
