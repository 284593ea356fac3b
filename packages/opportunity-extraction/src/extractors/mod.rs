//! Structured-completion backends.
//!
//! Both adapters send the same prompts and the same canonical schema; they
//! differ only in how the provider is told to return structured output.

pub mod gemini;
pub mod openai;
pub mod prompts;

pub use gemini::GeminiExtractor;
pub use openai::OpenAIExtractor;

use tracing::info;

use crate::config::{ModelProvider, Settings};
use crate::error::ConfigResult;
use crate::traits::StructuredExtractor;

/// Build the backend selected in `settings`.
///
/// Fails with `MissingCredential` before any network activity.
pub fn from_settings(settings: &Settings) -> ConfigResult<Box<dyn StructuredExtractor>> {
    let creds = settings.credentials()?;
    info!(
        provider = %creds.provider,
        model = %creds.model,
        key = %creds.key_hint(),
        "extractor selected"
    );

    let extractor: Box<dyn StructuredExtractor> = match creds.provider {
        ModelProvider::Gemini => Box::new(
            GeminiExtractor::from_credentials(&creds)
                .with_thinking_budget(settings.thinking_budget)
                .with_max_content_chars(settings.max_content_chars),
        ),
        ModelProvider::OpenAI => Box::new(
            OpenAIExtractor::from_credentials(&creds)
                .with_max_content_chars(settings.max_content_chars),
        ),
    };
    Ok(extractor)
}
