//! Provider-neutral conversation and request types.

use crate::error::Result;
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hard cap on tool-use rounds per generate call.
pub const MAX_TOOL_ROUNDS: usize = 2;

/// Sampling temperature for every request.
pub const TEMPERATURE: f32 = 0.0;

/// Upper bound on generated tokens per request.
pub const MAX_OUTPUT_TOKENS: u32 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned id echoed back with the result.
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Output of one tool invocation, fed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub tool_call_id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolUse(ToolCallRequest),
    ToolResult(ToolCallResult),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl ConversationMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// A user turn carrying a round's tool results, in call order.
    pub fn tool_results(results: Vec<ToolCallResult>) -> Self {
        Self {
            role: Role::User,
            content: results.into_iter().map(ContentBlock::ToolResult).collect(),
        }
    }
}

/// One request to a generation provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub system: String,
    pub messages: Vec<ConversationMessage>,
    /// Tools offered to the model; when present the model may choose freely.
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    /// The response is a finished answer.
    FinalText,
    /// The model is waiting on tool results.
    ToolRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    pub content: Vec<ContentBlock>,
    pub stop: StopKind,
}

impl GenerationResponse {
    /// Concatenated text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Requested tool calls in emission order.
    pub fn tool_calls(&self) -> Vec<ToolCallRequest> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }
}

/// A backend able to answer a [`GenerationRequest`].
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_text_and_calls() {
        let response = GenerationResponse {
            content: vec![
                ContentBlock::Text {
                    text: "Let me ".to_string(),
                },
                ContentBlock::ToolUse(ToolCallRequest {
                    id: "call_1".to_string(),
                    name: "search_course_content".to_string(),
                    arguments: json!({"query": "a"}),
                }),
                ContentBlock::Text {
                    text: "check.".to_string(),
                },
                ContentBlock::ToolUse(ToolCallRequest {
                    id: "call_2".to_string(),
                    name: "get_course_outline".to_string(),
                    arguments: json!({"course_name": "b"}),
                }),
            ],
            stop: StopKind::ToolRequest,
        };

        assert_eq!(response.text(), "Let me check.");
        let ids: Vec<_> = response.tool_calls().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["call_1", "call_2"]);
    }

    #[test]
    fn test_tool_results_turn_preserves_order() {
        let message = ConversationMessage::tool_results(vec![
            ToolCallResult {
                tool_call_id: "a".to_string(),
                content: "first".to_string(),
            },
            ToolCallResult {
                tool_call_id: "b".to_string(),
                content: "second".to_string(),
            },
        ]);

        assert_eq!(message.role, Role::User);
        assert!(matches!(
            &message.content[..],
            [ContentBlock::ToolResult(a), ContentBlock::ToolResult(b)]
                if a.tool_call_id == "a" && b.tool_call_id == "b"
        ));
    }
}
