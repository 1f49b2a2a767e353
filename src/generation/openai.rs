//! OpenAI chat-completions provider.

use super::types::{
    ContentBlock, ConversationMessage, GenerationProvider, GenerationRequest, GenerationResponse,
    Role, StopKind, ToolCallRequest,
};
use crate::config::GenerationSettings;
use crate::error::{CoursemateError, Result};
use crate::openai::create_client_with;
use crate::tools::ToolDefinition;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolChoiceOption, ChatCompletionToolType, CreateChatCompletionRequestArgs,
    FinishReason, FunctionCall, FunctionObject,
};
use async_openai::Client;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub struct OpenAIProvider {
    client: Client<OpenAIConfig>,
}

impl OpenAIProvider {
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self { client }
    }

    pub fn from_settings(settings: &GenerationSettings) -> Self {
        Self::new(create_client_with(
            Duration::from_secs(settings.timeout_secs),
            settings.api_base.as_deref(),
        ))
    }
}

fn builder_error(e: impl std::fmt::Display) -> CoursemateError {
    CoursemateError::Generation(e.to_string())
}

fn joined_text(message: &ConversationMessage) -> String {
    message
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

/// Flatten the conversation into chat messages, system instruction first.
fn chat_messages(request: &GenerationRequest) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system.clone())
            .build()
            .map_err(builder_error)?
            .into(),
    ];

    for message in &request.messages {
        let text = joined_text(message);

        match message.role {
            Role::User => {
                for block in &message.content {
                    if let ContentBlock::ToolResult(result) = block {
                        messages.push(
                            ChatCompletionRequestToolMessageArgs::default()
                                .tool_call_id(result.tool_call_id.clone())
                                .content(result.content.clone())
                                .build()
                                .map_err(builder_error)?
                                .into(),
                        );
                    }
                }
                if !text.is_empty() {
                    messages.push(
                        ChatCompletionRequestUserMessageArgs::default()
                            .content(text)
                            .build()
                            .map_err(builder_error)?
                            .into(),
                    );
                }
            }
            Role::Assistant => {
                let tool_calls: Vec<ChatCompletionMessageToolCall> = message
                    .content
                    .iter()
                    .filter_map(|block| match block {
                        ContentBlock::ToolUse(call) => Some(ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.to_string(),
                            },
                        }),
                        _ => None,
                    })
                    .collect();

                let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                if !text.is_empty() {
                    args.content(text);
                }
                if !tool_calls.is_empty() {
                    args.tool_calls(tool_calls);
                }
                messages.push(args.build().map_err(builder_error)?.into());
            }
        }
    }

    Ok(messages)
}

fn chat_tools(tools: &[ToolDefinition]) -> Vec<ChatCompletionTool> {
    tools
        .iter()
        .map(|tool| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(tool.input_schema.clone()),
                strict: None,
            },
        })
        .collect()
}

/// Convert a chat choice into a provider-neutral response.
fn convert_choice(
    content: Option<String>,
    tool_calls: Option<Vec<ChatCompletionMessageToolCall>>,
    finish_reason: Option<FinishReason>,
) -> GenerationResponse {
    let mut blocks = Vec::new();
    if let Some(text) = content.filter(|t| !t.is_empty()) {
        blocks.push(ContentBlock::Text { text });
    }

    let tool_calls = tool_calls.unwrap_or_default();
    let has_calls = !tool_calls.is_empty();
    for call in tool_calls {
        // Malformed argument JSON is passed through so the tool rejects it.
        let arguments = serde_json::from_str(&call.function.arguments)
            .unwrap_or_else(|_| Value::String(call.function.arguments.clone()));
        blocks.push(ContentBlock::ToolUse(ToolCallRequest {
            id: call.id,
            name: call.function.name,
            arguments,
        }));
    }

    let stop = if has_calls || matches!(finish_reason, Some(FinishReason::ToolCalls)) {
        StopKind::ToolRequest
    } else {
        StopKind::FinalText
    };

    GenerationResponse {
        content: blocks,
        stop,
    }
}

#[async_trait]
impl GenerationProvider for OpenAIProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&request.model)
            .messages(chat_messages(request)?)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_output_tokens);

        if let Some(tools) = &request.tools {
            args.tools(chat_tools(tools))
                .tool_choice(ChatCompletionToolChoiceOption::Auto);
        }

        let chat_request = args.build().map_err(builder_error)?;
        debug!("OpenAI request: {} messages", chat_request.messages.len());

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| CoursemateError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CoursemateError::Generation("No response from model".to_string()))?;

        Ok(convert_choice(
            choice.message.content,
            choice.message.tool_calls,
            choice.finish_reason,
        ))
    }
}
