//! Command-line interface definitions.
//!
//! `bulletin run` starts the forwarder; `bulletin check ...` validates a
//! deployment piece by piece without starting it.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG: &str = "config.toml";

/// Forwards a signed exchange-announcement feed to notification channels
#[derive(Parser, Debug)]
#[command(name = "bulletin")]
#[command(version)]
pub struct Cli {
    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the bulletin CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to the feed and forward announcements (foreground)
    Run(RunArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `bulletin check`.
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the configuration file and environment credentials.
    Config(ConfigPathArg),
    /// Send a test announcement through every enabled channel.
    Channels(ConfigPathArg),
    /// Open the signed feed once, wait for the subscription ack, disconnect.
    Connection(ConfigPathArg),
}

/// Shared argument struct for commands that require only a configuration path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
///
/// Optional fields override the corresponding configuration file values.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty-printed logs.
    #[arg(long)]
    pub json_logs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults_to_local_config() {
        let cli = Cli::try_parse_from(["bulletin", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config, PathBuf::from("config.toml"));
        assert!(args.log_level.is_none());
        assert!(!args.json_logs);
    }

    #[test]
    fn run_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "bulletin",
            "run",
            "-c",
            "/etc/bulletin.toml",
            "--log-level",
            "debug",
            "--json-logs",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config, PathBuf::from("/etc/bulletin.toml"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs);
    }

    #[test]
    fn check_subcommands_parse() {
        for (name, check) in [
            ("config", "Config"),
            ("channels", "Channels"),
            ("connection", "Connection"),
        ] {
            let cli = Cli::try_parse_from(["bulletin", "check", name, "--config", "x.toml"]).unwrap();
            let Commands::Check(command) = cli.command else {
                panic!("expected check");
            };
            assert!(format!("{command:?}").starts_with(check));
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["bulletin", "check", "config", "--json", "-q"]).unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["bulletin", "trade"]).is_err());
    }
}
