//! Gemini API client implementation

use crate::{
    error::GenAiError,
    types::{GenerateContentRequest, GenerateContentResponse},
};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Default endpoint root for the Gemini API
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model used for copywriting
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a new client with API key from environment
    ///
    /// # Errors
    ///
    /// Returns `GenAiError::MissingApiKey` if neither `GEMINI_API_KEY` nor
    /// `API_KEY` is set to a non-empty value
    pub fn from_env() -> Result<Self, GenAiError> {
        let api_key = ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty())
            .ok_or(GenAiError::MissingApiKey)?;

        Ok(Self::new(api_key))
    }

    /// Create a new client with explicit API key
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Point the client at a different endpoint root
    #[must_use]
    pub fn with_base_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a different model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Bound every request by `timeout`
    ///
    /// # Errors
    ///
    /// Returns `GenAiError::ClientSetup` if the HTTP client cannot be built
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, GenAiError> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenAiError::ClientSetup(e.to_string()))?;
        Ok(self)
    }

    /// Model this client talks to
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Call `models/{model}:generateContent`
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenAiError> {
        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.api_url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| GenAiError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<GenerateContentResponse>()
                .await
                .map_err(|e| GenAiError::ResponseParseFailed(e.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(GenAiError::RateLimited),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GenAiError::Unauthorized),
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(status = status.as_u16(), "Gemini request rejected");
                Err(GenAiError::ApiError {
                    status: status.as_u16(),
                    message: body,
                })
            },
        }
    }

    /// Ask the model for a single block of text
    ///
    /// # Errors
    ///
    /// Same as [`generate_content`](Self::generate_content), plus
    /// `GenAiError::EmptyResponse` when the answer carries no text
    pub async fn generate_text(&self, prompt: &str) -> Result<String, GenAiError> {
        let response = self
            .generate_content(&GenerateContentRequest::prompt(prompt))
            .await?;

        let text = response.text().unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Err(GenAiError::EmptyResponse);
        }

        tracing::debug!(model = %self.model, chars = text.len(), "Gemini text generated");
        Ok(text.to_string())
    }
}
