use std::process::ExitCode;

use anyhow::Context;
use bulletin::adapter::inbound::cli::command::{CheckCommand, Cli, Commands};
use bulletin::adapter::inbound::cli::{self, output};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    // reqwest and tokio-tungstenite share one rustls build; pin its provider.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let name = match &cli.command {
        Commands::Run(_) => "run",
        Commands::Check(CheckCommand::Config(_)) => "check config",
        Commands::Check(CheckCommand::Channels(_)) => "check channels",
        Commands::Check(CheckCommand::Connection(_)) => "check connection",
    };
    cli::execute(cli).await.with_context(|| format!("{name} failed"))
}
