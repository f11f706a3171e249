//! LLM provider clients implementing [`Llm`](crate::port::Llm).

pub mod anthropic;
pub mod openai;

use std::sync::Arc;

use crate::error::{ConfigError, Result};
use crate::infrastructure::config::translation::{TranslationConfig, TranslationProvider};
use crate::port::Llm;

pub use anthropic::Anthropic;
pub use openai::OpenAiCompatible;

/// Build the provider selected by the translation settings.
///
/// # Errors
///
/// Returns a config error if the API key, or a required base URL, is missing.
#[allow(clippy::result_large_err)]
pub fn from_config(config: &TranslationConfig) -> Result<Arc<dyn Llm>> {
    let api_key = config
        .api_key
        .clone()
        .ok_or(ConfigError::MissingField {
            field: "TRANSLATION_API_KEY",
        })?;
    let base_url = config.base_url.as_deref().filter(|u| !u.is_empty());

    let llm: Arc<dyn Llm> = match (config.provider, base_url) {
        (TranslationProvider::Anthropic, None) => Arc::new(
            Anthropic::new(api_key, &config.model, config.max_tokens, config.temperature)
                .with_headers(&config.headers),
        ),
        (TranslationProvider::Anthropic | TranslationProvider::CustomAnthropic, Some(url)) => {
            Arc::new(
                Anthropic::new(api_key, &config.model, config.max_tokens, config.temperature)
                    .with_base_url(url)
                    .with_headers(&config.headers),
            )
        }
        (TranslationProvider::OpenaiCompatible, Some(url)) => Arc::new(
            OpenAiCompatible::new(url, api_key, &config.model, config.max_tokens, config.temperature)
                .with_headers(&config.headers),
        ),
        (provider, None) => {
            return Err(ConfigError::InvalidValue {
                field: "translation.base_url",
                reason: format!("required for provider {}", provider.as_str()),
            }
            .into())
        }
    };
    Ok(llm)
}

/// Join a base URL and an API path without doubling slashes.
fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}
