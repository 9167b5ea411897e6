//! Gemini API client

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use super::types::*;
use super::ChatBackend;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new client for `model` authenticated with `api_key`
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different API host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}/models/{}:generateContent",
            self.base_url, API_VERSION, self.model
        )
    }

    /// Build headers for API requests
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(&self.api_key).context("Invalid API key")?,
        );
        Ok(headers)
    }

    /// Generate a response (non-streaming)
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        tracing::debug!(
            "POST {} ({} contents, {} tools)",
            self.endpoint(),
            request.contents.len(),
            request.tools.len()
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .headers(self.headers()?)
            .json(request)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
                anyhow::bail!("API error ({}): {}", status, api_error.error.message);
            } else {
                anyhow::bail!("API error ({}): {}", status, error_text);
            }
        }

        let response: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse API response")?;

        if let Some(usage) = response.usage_metadata {
            tracing::debug!(
                "Usage: prompt {} / candidates {} / total {} tokens",
                usage.prompt_token_count,
                usage.candidates_token_count,
                usage.total_token_count
            );
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatBackend for GeminiClient {
    async fn generate(&self, request: GenerateContentRequest) -> Result<GenerateContentResponse> {
        self.generate_content(&request).await
    }
}
