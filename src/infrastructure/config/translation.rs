//! Translation (enrichment) configuration.
//!
//! The API key is read from `TRANSLATION_API_KEY`, falling back to
//! `ANTHROPIC_API_KEY` for the anthropic provider.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// LLM provider used for translation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranslationProvider {
    /// Anthropic Messages API, optionally at a custom base URL.
    #[default]
    Anthropic,
    /// Anthropic-compatible third-party endpoint; `base_url` required.
    CustomAnthropic,
    /// OpenAI-compatible chat completions endpoint; `base_url` required.
    OpenaiCompatible,
}

impl TranslationProvider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::CustomAnthropic => "custom-anthropic",
            Self::OpenaiCompatible => "openai-compatible",
        }
    }

    /// Whether this provider cannot work without an explicit base URL.
    #[must_use]
    pub const fn requires_base_url(self) -> bool {
        matches!(self, Self::CustomAnthropic | Self::OpenaiCompatible)
    }
}

/// Which language(s) channels render when a translation is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationMode {
    Original,
    Translated,
    #[default]
    Both,
}

/// Translation enricher settings.
#[derive(Clone, Deserialize)]
pub struct TranslationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub provider: TranslationProvider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub mode: TranslationMode,
    /// Per-request timeout (milliseconds).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Body text beyond this many characters is cut before translation.
    #[serde(default = "default_max_body_chars")]
    pub max_body_chars: usize,
    /// Extra HTTP headers sent with every provider request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    "claude-3-haiku-20240307".into()
}

const fn default_timeout_ms() -> u64 {
    15_000
}

const fn default_max_tokens() -> usize {
    1_000
}

fn default_temperature() -> f64 {
    0.1
}

const fn default_max_body_chars() -> usize {
    5_000
}

impl TranslationConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: TranslationProvider::default(),
            model: default_model(),
            base_url: None,
            mode: TranslationMode::default(),
            timeout_ms: default_timeout_ms(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_body_chars: default_max_body_chars(),
            headers: BTreeMap::new(),
            api_key: None,
        }
    }
}

impl std::fmt::Debug for TranslationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("mode", &self.mode)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("max_body_chars", &self.max_body_chars)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
