//! Retrieval tools the model may call while answering.
//!
//! Every tool implements [`Tool`]; the [`ToolRegistry`] advertises their
//! definitions to the generator, dispatches calls by name, and exposes the
//! citation sources produced along the way.

mod outline;
mod registry;
mod search;

pub use outline::CourseOutlineTool;
pub use registry::ToolRegistry;
pub use search::CourseSearchTool;

use crate::error::{CoursemateError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema describing the tool's arguments.
    pub input_schema: Value,
}

/// A named capability the model can invoke mid-conversation.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Definition advertised to the model. The name must be unique within a registry.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with the model-supplied arguments.
    ///
    /// `Err` means the tool could not run at all (bad arguments, storage
    /// failure); anything the model should read, including "nothing found",
    /// is returned as `Ok` text.
    async fn execute(&mut self, arguments: &Value) -> Result<String>;

    /// Citations produced by the most recent `execute`.
    fn last_sources(&self) -> &[String] {
        &[]
    }

    /// Drop any citations held from earlier executions.
    fn reset_sources(&mut self) {}
}

/// Deserialize model-supplied arguments into a tool's argument struct.
pub(crate) fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: &Value) -> Result<T> {
    serde_json::from_value(arguments.clone()).map_err(|e| CoursemateError::InvalidToolArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

/// Wrap a label in an anchor that opens in a new tab.
pub(crate) fn anchor(href: &str, label: &str) -> String {
    format!(r#"<a href="{}" target="_blank">{}</a>"#, href, label)
}
