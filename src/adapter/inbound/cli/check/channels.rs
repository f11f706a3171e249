use std::path::Path;
use std::sync::Arc;

use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::memory::MemoryStore;
use crate::application::router::{DistributionRouter, RecordFilter};
use crate::domain::{ChannelOutcome, Record};
use crate::error::{Error, Result};
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;
use crate::port::Enricher;

/// Translate a test record when translation is enabled, then send a test
/// record through every enabled channel and report each result.
pub async fn execute_channels<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = Config::load(config_path.as_ref())?;
    let channels = bootstrap::build_channels(&config)?;
    let enricher = bootstrap::build_enricher(&config)?;

    output::section("Channel Check");
    let translation = match &enricher {
        Some(enricher) => check_translation(enricher.as_ref()).await,
        None => Ok(()),
    };

    if channels.is_empty() {
        output::warning("No channels enabled");
        output::hint("enable [telegram] or [showdoc] in the config file");
        return translation;
    }

    let router = DistributionRouter::new(
        RecordFilter::new(&config.filters),
        channels,
        None,
        Arc::new(MemoryStore::new()),
    );

    let pb = output::spinner("Sending test announcement...");
    let outcomes = router.test_channels().await;
    let delivered = outcomes.iter().filter(|o| o.report.success).count();
    if delivered == 0 {
        output::spinner_fail(&pb, "No channel accepted the test announcement");
    } else {
        output::spinner_success(&pb, "Test announcement sent");
    }

    for outcome in &outcomes {
        print_outcome(outcome);
    }

    verdict(&outcomes).and(translation)
}

async fn check_translation(enricher: &dyn Enricher) -> Result<()> {
    let pb = output::spinner("Testing translation provider...");
    match translate_sample(enricher).await {
        Ok(translated) => {
            output::spinner_success(&pb, "Translation provider replied");
            if let Some(title) = &translated.translated_title {
                output::field("Title", title);
            }
            Ok(())
        }
        Err(e) => {
            output::spinner_fail(&pb, "Translation provider failed");
            output::warning(&e.to_string());
            Err(e)
        }
    }
}

/// One translation of the test record, which must come back translated.
async fn translate_sample(enricher: &dyn Enricher) -> Result<Record> {
    let translated = enricher.enrich(&Record::test_record()).await?;
    if translated.has_translation() {
        Ok(translated)
    } else {
        Err(Error::Enrichment("provider returned no translation".to_string()))
    }
}

fn print_outcome(outcome: &ChannelOutcome) {
    let report = &outcome.report;
    if report.success {
        output::success(&format!("{} delivered", outcome.channel));
    } else {
        output::warning(&format!(
            "{} failed: {}",
            outcome.channel,
            report.error.as_deref().unwrap_or("unknown error")
        ));
    }

    for recipient in &report.recipients {
        let status = match &recipient.error {
            None => "ok".to_string(),
            Some(error) => format!("failed ({error})"),
        };
        output::field(&recipient.recipient, status);
    }
}

/// Succeeds when every channel accepted the test record.
#[allow(clippy::result_large_err)]
fn verdict(outcomes: &[ChannelOutcome]) -> Result<()> {
    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| !o.report.success)
        .map(|o| o.channel.as_str())
        .collect();
    if failed.is_empty() {
        output::success("All channels delivered");
        Ok(())
    } else {
        Err(Error::Channel(format!(
            "test delivery failed for {}",
            failed.join(", ")
        )))
    }
}
