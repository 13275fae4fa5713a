//! Hype text: an optional AI-written event description.
//!
//! The provider never fails. Whatever goes wrong (no API key, transport error,
//! non-success status, empty answer) the caller gets the static description
//! back, marked [`HypeSource::Fallback`] so the path taken stays observable.

use crate::config::GenAiConfig;
use horizon_genai::{GeminiClient, GenAiError};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Where a hype text came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HypeSource {
    /// Generated by the model
    Remote,
    /// The static description
    Fallback,
}

/// A display description and its origin
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HypeText {
    /// Text to show
    pub text: String,
    /// Origin
    pub source: HypeSource,
}

impl HypeText {
    /// A remote result
    #[must_use]
    pub fn remote(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: HypeSource::Remote,
        }
    }

    /// The static fallback
    #[must_use]
    pub fn fallback(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: HypeSource::Fallback,
        }
    }

    /// Whether the model produced this text
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.source == HypeSource::Remote
    }
}

/// Boxed future returned by [`HypeTextProvider::generate`]
pub type HypeFuture = Pin<Box<dyn Future<Output = HypeText> + Send>>;

/// Best-effort description provider
pub trait HypeTextProvider: Send + Sync {
    /// Describe the event titled `title`; resolves to `fallback` on any failure
    fn generate(&self, title: String, fallback: String) -> HypeFuture;
}

/// Copywriting prompt for one event
#[must_use]
pub fn hype_prompt(title: &str, description: &str) -> String {
    format!(
        "You are a creative copywriter for a futuristic, cyberpunk event platform called \
         \"Floating Worlds\". Write a short, cinematic paragraph (max 60 words) for the event \
         titled \"{title}\". Use words related to light, sound, immersion, and the future. \
         Base context: {description}. Do not use hashtags."
    )
}

/// Always returns the fallback
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticHypeProvider;

impl HypeTextProvider for StaticHypeProvider {
    fn generate(&self, _title: String, fallback: String) -> HypeFuture {
        Box::pin(async move { HypeText::fallback(fallback) })
    }
}

/// Gemini-backed provider
#[derive(Clone, Debug)]
pub struct GenAiHypeProvider {
    client: Option<GeminiClient>,
}

impl GenAiHypeProvider {
    /// Use `client` for every request
    #[must_use]
    pub const fn new(client: GeminiClient) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Build from configuration; without an API key every request falls back
    #[must_use]
    pub fn from_config(config: &GenAiConfig) -> Self {
        let Some(api_key) = config.api_key.clone() else {
            tracing::info!("No Gemini API key configured, hype text uses static descriptions");
            return Self { client: None };
        };

        let client = GeminiClient::new(api_key)
            .with_base_url(&config.api_url)
            .with_model(&config.model)
            .with_timeout(config.timeout);

        match client {
            Ok(client) => Self::new(client),
            Err(error) => {
                tracing::warn!(%error, "Gemini client unavailable, hype text disabled");
                Self { client: None }
            },
        }
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(config: &GenAiConfig) -> Arc<dyn HypeTextProvider> {
        Arc::new(Self::from_config(config))
    }

    /// Whether requests go to the model at all
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.client.is_some()
    }
}

impl HypeTextProvider for GenAiHypeProvider {
    fn generate(&self, title: String, fallback: String) -> HypeFuture {
        let client = self.client.clone();
        Box::pin(async move {
            let result = match client {
                Some(client) => client.generate_text(&hype_prompt(&title, &fallback)).await,
                None => Err(GenAiError::MissingApiKey),
            };

            match result {
                Ok(text) => {
                    metrics::counter!("hype.remote.total").increment(1);
                    tracing::debug!(%title, "Hype text generated");
                    HypeText::remote(text)
                },
                Err(error) => {
                    metrics::counter!("hype.fallback.total").increment(1);
                    tracing::warn!(%title, %error, "Hype text unavailable, using static description");
                    HypeText::fallback(fallback)
                },
            }
        })
    }
}
