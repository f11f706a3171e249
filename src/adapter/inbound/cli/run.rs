//! Handler for the `run` command.

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::runtime;

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    apply_overrides(&mut config, args, output::is_json());
    config.init_logging();

    if !output::is_quiet() && config.logging.format != "json" {
        print_startup(&config);
    }

    runtime::run(config).await
}

fn apply_overrides(config: &mut Config, args: &RunArgs, force_json_logs: bool) {
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    if args.json_logs || force_json_logs {
        config.logging.format = "json".to_string();
    }
}

fn print_startup(config: &Config) {
    let channels = config.enabled_channels();

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Feed", &config.feed.ws_url);
    output::field("Topic", &config.feed.topic);
    output::field(
        "Channels",
        if channels.is_empty() {
            "none".to_string()
        } else {
            channels.join(", ")
        },
    );
    output::field(
        "Translation",
        if config.translation.enabled {
            config.translation.provider.as_str()
        } else {
            "disabled"
        },
    );
    output::field(
        "Database",
        if config.database.enabled {
            config.database.path.as_str()
        } else {
            "in-memory"
        },
    );
    if config.admin.enabled {
        output::field("Admin", format!("http://{}", config.admin.bind_address()));
    }
    println!();
}
