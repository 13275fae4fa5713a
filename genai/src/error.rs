//! Error types for the Gemini API client

use thiserror::Error;

/// Errors that can occur when interacting with the Gemini API
#[derive(Debug, Error)]
pub enum GenAiError {
    /// Neither `GEMINI_API_KEY` nor `API_KEY` is set
    #[error("Missing GEMINI_API_KEY / API_KEY environment variable")]
    MissingApiKey,

    /// HTTP client could not be built
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Rate limited - too many requests
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Unauthorized - invalid or missing API key
    #[error("Unauthorized - invalid API key")]
    Unauthorized,

    /// API returned an error
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error body from the API
        message: String,
    },

    /// The model answered without any text
    #[error("Model returned no text")]
    EmptyResponse,
}
