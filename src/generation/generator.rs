//! The bounded tool-use conversation loop.

use super::types::{
    ConversationMessage, GenerationProvider, GenerationRequest, StopKind,
    ToolCallResult, MAX_OUTPUT_TOKENS, MAX_TOOL_ROUNDS, TEMPERATURE,
};
use crate::config::Prompts;
use crate::error::CoursemateError;
use crate::tools::{ToolDefinition, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const TOOL_FAILURE_MESSAGE: &str =
    "I encountered an error while searching for information. Please try rephrasing your question.";
pub const GENERATION_FAILURE_MESSAGE: &str = "I encountered an error while generating the response.";
pub const SYNTHESIS_FAILURE_MESSAGE: &str =
    "I encountered an error while generating the final response.";

/// Where a generate call gave up.
#[derive(Debug)]
enum Failure {
    Tool(CoursemateError),
    Generation(CoursemateError),
    Synthesis(CoursemateError),
}

impl Failure {
    fn user_message(&self) -> &'static str {
        match self {
            Failure::Tool(_) => TOOL_FAILURE_MESSAGE,
            Failure::Generation(_) => GENERATION_FAILURE_MESSAGE,
            Failure::Synthesis(_) => SYNTHESIS_FAILURE_MESSAGE,
        }
    }
}

/// Answers questions with a model that may call retrieval tools.
pub struct AiGenerator {
    provider: Arc<dyn GenerationProvider>,
    model: String,
    system_prompt: String,
    max_tool_rounds: usize,
}

impl AiGenerator {
    pub fn new(provider: Arc<dyn GenerationProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: Prompts::default().system_instruction(),
            max_tool_rounds: MAX_TOOL_ROUNDS,
        }
    }

    /// Replace the fixed instruction block.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Answer `query`, letting the model call tools for up to two rounds.
    ///
    /// Never fails: provider and tool errors are logged and replaced by a
    /// fixed user-facing sentence.
    #[instrument(skip_all, fields(model = %self.model))]
    pub async fn generate(
        &self,
        query: &str,
        history: Option<&str>,
        tool_definitions: Option<&[ToolDefinition]>,
        registry: Option<&mut ToolRegistry>,
    ) -> String {
        match self.run(query, history, tool_definitions, registry).await {
            Ok(answer) => answer,
            Err(failure) => {
                warn!("Generation failed: {:?}", failure);
                failure.user_message().to_string()
            }
        }
    }

    async fn run(
        &self,
        query: &str,
        history: Option<&str>,
        tool_definitions: Option<&[ToolDefinition]>,
        registry: Option<&mut ToolRegistry>,
    ) -> Result<String, Failure> {
        let system = self.system_content(history);
        let mut messages = vec![ConversationMessage::user_text(query)];

        let tools = tool_definitions.filter(|defs| !defs.is_empty());
        let (tools, registry) = match (tools, registry) {
            (Some(tools), Some(registry)) => (tools, registry),
            (tools, _) => {
                let request = self.request(&system, messages, tools.map(<[ToolDefinition]>::to_vec));
                let response = self
                    .provider
                    .generate(&request)
                    .await
                    .map_err(Failure::Generation)?;
                return Ok(response.text());
            }
        };

        let mut round = 0;
        loop {
            round += 1;
            debug!("Tool round {} of {}", round, self.max_tool_rounds);

            let request = self.request(&system, messages.clone(), Some(tools.to_vec()));
            let response = self
                .provider
                .generate(&request)
                .await
                .map_err(Failure::Generation)?;

            if response.stop == StopKind::FinalText {
                return Ok(response.text());
            }

            let calls = response.tool_calls();
            if calls.is_empty() {
                return Err(Failure::Tool(CoursemateError::Generation(
                    "model requested tool use without any tool calls".to_string(),
                )));
            }

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                info!("Calling tool {} with {}", call.name, call.arguments);
                let content = registry
                    .execute_tool(&call.name, &call.arguments)
                    .await
                    .map_err(Failure::Tool)?;
                debug!("Tool {} returned {} bytes", call.name, content.len());
                results.push(ToolCallResult {
                    tool_call_id: call.id.clone(),
                    content,
                });
            }

            messages.push(ConversationMessage::assistant(response.content));
            messages.push(ConversationMessage::tool_results(results));

            if round >= self.max_tool_rounds {
                info!("Tool round budget spent, requesting final answer");
                let request = self.request(&system, messages, None);
                let response = self
                    .provider
                    .generate(&request)
                    .await
                    .map_err(Failure::Synthesis)?;
                return Ok(response.text());
            }
        }
    }

    fn system_content(&self, history: Option<&str>) -> String {
        match history.filter(|h| !h.is_empty()) {
            Some(history) => format!("{}\n\nPrevious conversation:\n{}", self.system_prompt, history),
            None => self.system_prompt.clone(),
        }
    }

    fn request(
        &self,
        system: &str,
        messages: Vec<ConversationMessage>,
        tools: Option<Vec<ToolDefinition>>,
    ) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
            system: system.to_string(),
            messages,
            tools,
        }
    }
}
