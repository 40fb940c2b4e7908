//! Provider Factory
//!
//! Maps a [`ProviderConfig`] to the adapter that serves its provider type.

use std::sync::Arc;

use super::anthropic::AnthropicProvider;
use super::gemini::GeminiProvider;
use super::openai::OpenAICompatibleProvider;
use super::provider::LlmProvider;
use super::types::{LlmResult, ProviderConfig, ProviderType};

/// Create the adapter for `config.provider`.
pub fn create_provider(config: ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderType::Gemini => Arc::new(GeminiProvider::new(config)?),
        ProviderType::Claude => Arc::new(AnthropicProvider::new(config)?),
        ProviderType::OpenAI
        | ProviderType::Grok
        | ProviderType::OpenRouter
        | ProviderType::CustomOpenAI => Arc::new(OpenAICompatibleProvider::new(config)?),
    };
    Ok(provider)
}
