//! Completion Provider Abstraction
//!
//! The chat feature talks to an OpenAI-compatible chat-completions endpoint
//! through the [`CompletionProvider`] trait. Providers return plain text;
//! prompt assembly and fallback behavior live in the chat service, which is
//! why this seam stays a single method.

pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;

use crate::types::Result;

pub use openai::OpenAiProvider;

/// Settings for constructing a provider. The API key is promoted into a
/// `SecretString` at construction; it never appears in Debug output.
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            model: None,
            temperature: 0.7,
            max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// A chat-completion backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// One system + user exchange, returning the assistant text.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    fn name(&self) -> &str;
}

/// Build the configured provider.
pub fn create_provider(config: ProviderConfig) -> Result<Arc<dyn CompletionProvider>> {
    Ok(Arc::new(OpenAiProvider::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ProviderConfig {
            api_key: Some("sk-very-secret".to_string()),
            ..ProviderConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
