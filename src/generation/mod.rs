//! Answer generation: provider adapters and the bounded tool-use loop.

mod anthropic;
mod generator;
mod openai;
mod types;

pub use anthropic::AnthropicProvider;
pub use generator::{
    AiGenerator, GENERATION_FAILURE_MESSAGE, SYNTHESIS_FAILURE_MESSAGE, TOOL_FAILURE_MESSAGE,
};
pub use openai::OpenAIProvider;
pub use types::{
    ContentBlock, ConversationMessage, GenerationProvider, GenerationRequest, GenerationResponse,
    Role, StopKind, ToolCallRequest, ToolCallResult, MAX_OUTPUT_TOKENS, MAX_TOOL_ROUNDS,
    TEMPERATURE,
};

use crate::config::{GenerationProviderKind, GenerationSettings};
use crate::error::{CoursemateError, Result};
use std::sync::Arc;

/// Build the provider selected in settings.
///
/// Requires the provider's API key in the environment.
pub fn provider_from_settings(settings: &GenerationSettings) -> Result<Arc<dyn GenerationProvider>> {
    match settings.provider {
        GenerationProviderKind::Anthropic => {
            let key_var = settings.provider.api_key_env();
            let api_key = std::env::var(key_var)
                .map_err(|_| CoursemateError::Config(format!("{} is not set", key_var)))?;
            Ok(Arc::new(AnthropicProvider::from_settings(api_key, settings)))
        }
        GenerationProviderKind::OpenAI => Ok(Arc::new(OpenAIProvider::from_settings(settings))),
    }
}
