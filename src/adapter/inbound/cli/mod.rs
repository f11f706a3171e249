//! CLI module graph.

pub mod check;
pub mod command;
pub mod output;
pub mod run;

use command::{CheckCommand, Cli, Commands};
use output::OutputConfig;

use crate::error::Result;

/// Dispatch a parsed command line.
pub async fn execute(cli: Cli) -> Result<()> {
    output::configure(OutputConfig::new(cli.json, cli.quiet));

    match cli.command {
        Commands::Run(args) => run::execute(&args).await,
        Commands::Check(CheckCommand::Config(arg)) => check::config::execute_config(&arg.config),
        Commands::Check(CheckCommand::Channels(arg)) => {
            check::channels::execute_channels(&arg.config).await
        }
        Commands::Check(CheckCommand::Connection(arg)) => {
            check::connection::execute_connection(&arg.config).await
        }
    }
}
