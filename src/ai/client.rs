use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::config::GeminiConfig;

use super::{
    error::ModelError,
    inference::{build_request, classify_failure, endpoint_url, extract_completion},
};

/// Single-shot text completion. Implementations never retry.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn classify(&self, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(http: Client, config: GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .filter(|key| !key.is_empty())
            .context("GEMINI_API_KEY must be configured for classification")?;

        Ok(Self {
            http,
            endpoint: endpoint_url(&config.api_base, &config.model),
            api_key,
        })
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn classify(&self, prompt: &str) -> Result<String, ModelError> {
        let request = build_request(prompt);
        tracing::debug!(
            target: "gemini",
            endpoint = %self.endpoint,
            prompt_len = prompt.len(),
            "sending generateContent request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|err| ModelError::Transport(err.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ModelError::Transport(err.without_url()))?;

        if !status.is_success() {
            let err = classify_failure(status, &body);
            tracing::error!(
                target: "gemini",
                status = status.as_u16(),
                kind = err.kind(),
                error = %err,
                "generateContent failed"
            );
            return Err(err);
        }

        let completion = extract_completion(&body)?;
        tracing::debug!(target: "gemini", completion = %completion, "raw completion");
        Ok(completion)
    }
}
