//! # Gemini API Client
//!
//! Small client for the Gemini `generateContent` endpoint, enough to ask a
//! model for a single block of text.
//!
//! ## Example
//!
//! ```no_run
//! use horizon_genai::GeminiClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY (or API_KEY)
//!     let client = GeminiClient::from_env()?;
//!
//!     let text = client.generate_text("Describe a neon orchestra in one line.").await?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod types;

// Re-export main types for convenience
pub use client::{DEFAULT_API_URL, DEFAULT_MODEL, GeminiClient};
pub use error::GenAiError;
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
