use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Validate the configuration file and credentials without connecting.
#[allow(clippy::result_large_err)]
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();

    output::section("Configuration Check");
    output::field("Config", path.display());

    let config = match Config::load(path) {
        Ok(config) => config,
        Err(e) => {
            output::error(&e.to_string());
            return Err(e);
        }
    };
    output::success("Configuration file is valid");

    output::section("Feed");
    output::field("WebSocket", &config.feed.ws_url);
    output::field("Topic", &config.feed.topic);
    output::field("Lifetime", format!("{}s", config.feed.lifetime_secs));
    output::field(
        "Reconnect",
        format!(
            "{} attempts, {}ms..{}ms",
            config.reconnection.max_attempts,
            config.reconnection.base_delay_ms,
            config.reconnection.max_delay_ms
        ),
    );
    output::success("Feed credentials detected");

    output::section("Delivery");
    let channels = config.enabled_channels();
    if channels.is_empty() {
        output::warning("No channels enabled; records will only be stored");
    } else {
        output::field("Channels", channels.join(", "));
    }
    if config.showdoc.enabled {
        output::field(
            "Recipients",
            config
                .showdoc
                .recipients
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        );
    }
    #[cfg(not(feature = "telegram"))]
    if config.telegram.enabled {
        output::warning("Telegram is enabled but this build lacks the telegram feature");
    }

    if config.translation.enabled {
        output::field(
            "Translation",
            format!(
                "{} ({}, mode {:?})",
                config.translation.provider.as_str(),
                config.translation.model,
                config.translation.mode
            ),
        );
    } else {
        output::field("Translation", "disabled");
    }

    let filters = &config.filters;
    if !filters.categories.is_empty() {
        output::field("Categories", filters.categories.join(", "));
    }
    if !filters.keywords.is_empty() {
        output::field("Keywords", filters.keywords.join(", "));
    }
    if !filters.exclude_keywords.is_empty() {
        output::field("Excluded", filters.exclude_keywords.join(", "));
    }

    output::section("Runtime");
    output::field(
        "Database",
        if config.database.enabled {
            config.database.path.clone()
        } else {
            "in-memory".to_string()
        },
    );
    if config.admin.enabled {
        output::field("Admin", format!("http://{}", config.admin.bind_address()));
    } else {
        output::field("Admin", "disabled");
    }

    output::success("Configuration check complete");
    Ok(())
}
