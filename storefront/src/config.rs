//! Configuration management for the storefront.
//!
//! Loads configuration from environment variables with defaults. Unset or
//! empty variables take the default; a present but malformed value is a
//! [`ConfigError::Invalid`].

use horizon_genai::{DEFAULT_API_URL, DEFAULT_MODEL};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "horizon_storefront=info,horizon_runtime=info";

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        /// Variable name
        key: String,
        /// Raw value
        value: String,
        /// Parse failure
        reason: String,
    },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Tracing filter directive
    pub log_filter: String,
    /// Catalog JSON file; `None` uses the built-in catalog
    pub catalog_path: Option<PathBuf>,
    /// Purchase flow settings
    pub purchase: PurchaseConfig,
    /// Copywriting model settings
    pub genai: GenAiConfig,
}

/// Purchase flow settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseConfig {
    /// How long the simulated processor takes to confirm
    pub payment_delay: Duration,
    /// Upper bound on one payment attempt before the flow fails
    pub payment_timeout: Duration,
    /// Graceful shutdown timeout for flow stores
    pub shutdown_timeout: Duration,
}

/// Copywriting model settings
#[derive(Clone, PartialEq, Eq)]
pub struct GenAiConfig {
    /// API key; `None` disables remote hype text
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Endpoint root
    pub api_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for GenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for PurchaseConfig {
    fn default() -> Self {
        Self {
            payment_delay: Duration::from_millis(2000),
            payment_timeout: Duration::from_millis(10_000),
            shutdown_timeout: Duration::from_millis(5000),
        }
    }
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_millis(8000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            catalog_path: None,
            purchase: PurchaseConfig::default(),
            genai: GenAiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// A `.env` file in the working directory is read first, if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is the normal case
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric variable is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            log_filter: get("HORIZON_LOG").unwrap_or(defaults.log_filter),
            catalog_path: get("HORIZON_CATALOG_PATH").map(PathBuf::from),
            purchase: PurchaseConfig {
                payment_delay: millis(&get, "HORIZON_PAYMENT_DELAY_MS")?
                    .unwrap_or(defaults.purchase.payment_delay),
                payment_timeout: millis(&get, "HORIZON_PAYMENT_TIMEOUT_MS")?
                    .unwrap_or(defaults.purchase.payment_timeout),
                shutdown_timeout: millis(&get, "HORIZON_SHUTDOWN_TIMEOUT_MS")?
                    .unwrap_or(defaults.purchase.shutdown_timeout),
            },
            genai: GenAiConfig {
                api_key: get("GEMINI_API_KEY").or_else(|| get("API_KEY")),
                model: get("GEMINI_MODEL").unwrap_or(defaults.genai.model),
                api_url: get("GEMINI_API_URL").unwrap_or(defaults.genai.api_url),
                timeout: millis(&get, "GEMINI_TIMEOUT_MS")?.unwrap_or(defaults.genai.timeout),
            },
        })
    }
}

fn millis<G>(get: &G, key: &str) -> Result<Option<Duration>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| ConfigError::Invalid {
                    key: key.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}
