//! Anthropic Messages API provider.

use super::types::{
    ContentBlock, ConversationMessage, GenerationProvider, GenerationRequest, GenerationResponse,
    Role, StopKind, ToolCallRequest,
};
use crate::config::GenerationSettings;
use crate::error::{CoursemateError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    api_base: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: Role,
    content: Vec<WireContent>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireContent {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContent>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseContent {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>, api_base: Option<&str>, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        });

        Self {
            client,
            api_key: api_key.into(),
            api_base: api_base
                .unwrap_or(ANTHROPIC_API_BASE)
                .trim_end_matches('/')
                .to_string(),
        }
    }

    pub fn from_settings(api_key: String, settings: &GenerationSettings) -> Self {
        Self::new(
            api_key,
            settings.api_base.as_deref(),
            Duration::from_secs(settings.timeout_secs),
        )
    }
}

fn wire_message(message: &ConversationMessage) -> WireMessage {
    let content = message
        .content
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text } => WireContent::Text { text: text.clone() },
            ContentBlock::ToolUse(call) => WireContent::ToolUse {
                id: call.id.clone(),
                name: call.name.clone(),
                input: call.arguments.clone(),
            },
            ContentBlock::ToolResult(result) => WireContent::ToolResult {
                tool_use_id: result.tool_call_id.clone(),
                content: result.content.clone(),
            },
        })
        .collect();

    WireMessage {
        role: message.role,
        content,
    }
}

fn build_body(request: &GenerationRequest) -> MessagesRequest<'_> {
    let tools = request.tools.as_ref().map(|tools| {
        tools
            .iter()
            .map(|t| WireTool {
                name: &t.name,
                description: &t.description,
                input_schema: &t.input_schema,
            })
            .collect::<Vec<_>>()
    });

    MessagesRequest {
        model: &request.model,
        max_tokens: request.max_output_tokens,
        temperature: request.temperature,
        system: &request.system,
        messages: request.messages.iter().map(wire_message).collect(),
        tool_choice: tools.as_ref().map(|_| json!({"type": "auto"})),
        tools,
    }
}

fn convert_response(response: MessagesResponse) -> GenerationResponse {
    let content = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ResponseContent::Text { text } => Some(ContentBlock::Text { text }),
            ResponseContent::ToolUse { id, name, input } => {
                Some(ContentBlock::ToolUse(ToolCallRequest {
                    id,
                    name,
                    arguments: input,
                }))
            }
            ResponseContent::Other => None,
        })
        .collect();

    let stop = match response.stop_reason.as_deref() {
        Some("tool_use") => StopKind::ToolRequest,
        _ => StopKind::FinalText,
    };

    GenerationResponse { content, stop }
}

#[async_trait]
impl GenerationProvider for AnthropicProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let body = build_body(request);
        debug!(
            "Anthropic request: {} messages, tools: {}",
            body.messages.len(),
            body.tools.is_some()
        );

        let response = self
            .client
            .post(format!("{}/v1/messages", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(CoursemateError::Generation(format!(
                "Anthropic API error ({}): {}",
                status, message
            )));
        }

        let parsed: MessagesResponse = response.json().await?;
        Ok(convert_response(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::types::ToolCallResult;
    use crate::tools::ToolDefinition;

    fn request(tools: Option<Vec<ToolDefinition>>) -> GenerationRequest {
        GenerationRequest {
            model: "claude-test".to_string(),
            temperature: 0.0,
            max_output_tokens: 800,
            system: "SYSTEM".to_string(),
            messages: vec![
                ConversationMessage::user_text("What is ML?"),
                ConversationMessage::assistant(vec![ContentBlock::ToolUse(ToolCallRequest {
                    id: "toolu_1".to_string(),
                    name: "search_course_content".to_string(),
                    arguments: json!({"query": "ml"}),
                })]),
                ConversationMessage::tool_results(vec![ToolCallResult {
                    tool_call_id: "toolu_1".to_string(),
                    content: "found".to_string(),
                }]),
            ],
            tools,
        }
    }

    #[test]
    fn test_body_with_tools() {
        let tools = vec![ToolDefinition {
            name: "search_course_content".to_string(),
            description: "Search".to_string(),
            input_schema: json!({"type": "object"}),
        }];
        let req = request(Some(tools));
        let body = serde_json::to_value(build_body(&req)).unwrap();

        assert_eq!(body["model"], "claude-test");
        assert_eq!(body["max_tokens"], 800);
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["system"], "SYSTEM");
        assert_eq!(body["tool_choice"], json!({"type": "auto"}));
        assert_eq!(body["tools"][0]["name"], "search_course_content");
        assert_eq!(body["tools"][0]["input_schema"], json!({"type": "object"}));

        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"][0], json!({"type": "text", "text": "What is ML?"}));
        assert_eq!(
            body["messages"][1]["content"][0],
            json!({"type": "tool_use", "id": "toolu_1", "name": "search_course_content", "input": {"query": "ml"}})
        );
        assert_eq!(
            body["messages"][2]["content"][0],
            json!({"type": "tool_result", "tool_use_id": "toolu_1", "content": "found"})
        );
    }

    #[test]
    fn test_body_without_tools_omits_tool_fields() {
        let req = request(None);
        let body = serde_json::to_value(build_body(&req)).unwrap();

        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn test_convert_tool_use_response() {
        let raw = json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "Searching."},
                {"type": "tool_use", "id": "toolu_9", "name": "get_course_outline", "input": {"course_name": "MCP"}}
            ],
            "stop_reason": "tool_use"
        });
        let response = convert_response(serde_json::from_value(raw).unwrap());

        assert_eq!(response.stop, StopKind::ToolRequest);
        assert_eq!(response.text(), "Searching.");
        let calls = response.tool_calls();
        assert_eq!(calls[0].id, "toolu_9");
        assert_eq!(calls[0].arguments, json!({"course_name": "MCP"}));
    }

    #[test]
    fn test_convert_end_turn_response() {
        let raw = json!({
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "Done."}
            ],
            "stop_reason": "end_turn"
        });
        let response = convert_response(serde_json::from_value(raw).unwrap());

        assert_eq!(response.stop, StopKind::FinalText);
        assert_eq!(response.content.len(), 1);
        assert_eq!(response.text(), "Done.");
    }

    #[test]
    fn test_api_base_trailing_slash() {
        let provider = AnthropicProvider::new("key", Some("https://proxy.local/"), Duration::from_secs(5));
        assert_eq!(provider.api_base, "https://proxy.local");

        let provider = AnthropicProvider::new("key", None, Duration::from_secs(5));
        assert_eq!(provider.api_base, ANTHROPIC_API_BASE);
    }
}
