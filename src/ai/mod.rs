//! AI text-completion collaborators

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::prompt::PromptExample;

pub mod gemini;

pub use gemini::GeminiClient;

/// A text-completion service that turns a prompt plus few-shot examples into
/// a reply string
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        examples: &[PromptExample],
    ) -> Result<String, ServiceError>;
}

/// Stand-in used when no API key is configured. Structured searches still
/// work; anything needing interpretation fails as an external-service error.
pub struct UnconfiguredClient;

#[async_trait]
impl CompletionClient for UnconfiguredClient {
    async fn complete(
        &self,
        _prompt: &str,
        _examples: &[PromptExample],
    ) -> Result<String, ServiceError> {
        Err(ServiceError::Transport(
            "no AI API key configured (set GEMINI_API_KEY)".to_string(),
        ))
    }
}
