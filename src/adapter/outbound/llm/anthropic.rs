//! Anthropic Messages API client.
//!
//! Also serves Anthropic-compatible third-party endpoints through a custom
//! base URL.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::port::Llm;

use super::endpoint;

/// Default API root; `/messages` is appended.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// API version header value.
const API_VERSION: &str = "2023-06-01";

#[derive(Debug)]
pub struct Anthropic {
    client: Client,
    api_key: String,
    model: String,
    url: String,
    max_tokens: usize,
    temperature: f64,
    headers: Vec<(String, String)>,
}

impl Anthropic {
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: usize,
        temperature: f64,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            url: endpoint(DEFAULT_BASE_URL, "messages"),
            max_tokens,
            temperature,
            headers: Vec::new(),
        }
    }

    /// Send these extra headers with every request.
    #[must_use]
    pub fn with_headers(mut self, headers: &BTreeMap<String, String>) -> Self {
        self.headers = headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        self
    }

    /// Send requests to `<base_url>/messages` instead of the public API.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.url = endpoint(base_url, "messages");
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f64,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Response {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl Llm for Anthropic {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = Request {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let mut builder = self.client.post(&self.url);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = builder
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Enrichment(format!("anthropic returned HTTP {status}: {body}")));
        }

        let response = response.json::<Response>().await?;
        Ok(response
            .content
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}
