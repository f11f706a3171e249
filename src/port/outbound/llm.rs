//! LLM completion port used by the translation enricher.

use async_trait::async_trait;

use crate::error::Result;

/// Client for large language model text completion.
///
/// Implementations wrap a specific provider and handle authentication and
/// response parsing.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Provider name for logging and status.
    fn name(&self) -> &'static str;

    /// Send a completion request and return the generated text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
