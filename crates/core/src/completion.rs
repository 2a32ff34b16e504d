//! CompletionClient trait, the abstraction over the language-model service.
//!
//! A client knows how to send one prompt to one model and hand back the
//! generated text. It never invents fallback text: deciding what to show when
//! the call fails is the caller's job.
//!
//! Implementations: OpenAI-compatible endpoints (DashScope, OpenAI,
//! OpenRouter, Ollama) in `rapport-providers`, scripted mocks in tests.

use async_trait::async_trait;
use crate::error::CompletionError;

/// The core completion trait.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// A human-readable name for this client (e.g., "dashscope").
    fn name(&self) -> &str;

    /// Send a single prompt and wait for the full answer.
    ///
    /// `Ok(None)` means the service answered but produced no text.
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
    ) -> std::result::Result<Option<String>, CompletionError>;

    /// Health check: can we reach the service?
    async fn health_check(&self) -> std::result::Result<bool, CompletionError> {
        Ok(true)
    }
}
