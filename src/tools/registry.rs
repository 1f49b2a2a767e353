//! Name-keyed dispatch over registered tools.

use super::{Tool, ToolDefinition};
use crate::error::{CoursemateError, Result};
use serde_json::Value;
use tracing::debug;

/// Registered tools in registration order.
///
/// Sources are tracked per tool; [`ToolRegistry::get_last_sources`] reports
/// the citations of whichever tool most recently executed and produced any.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    /// Indices into `tools`, least recently executed first.
    executed: Vec<usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its definition's name.
    ///
    /// Registering a name twice replaces the earlier tool in place.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_boxed(Box::new(tool));
    }

    pub fn register_boxed(&mut self, tool: Box<dyn Tool>) {
        let name = tool.definition().name;

        match self.position(&name) {
            Some(index) => {
                debug!("Replacing tool {}", name);
                self.executed.retain(|&i| i != index);
                self.tools[index] = tool;
            }
            None => {
                debug!("Registered tool {}", name);
                self.tools.push(tool);
            }
        }
    }

    /// Definitions of every registered tool, in registration order.
    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Run a tool by name.
    pub async fn execute_tool(&mut self, name: &str, arguments: &Value) -> Result<String> {
        let index = self
            .position(name)
            .ok_or_else(|| CoursemateError::ToolNotFound(name.to_string()))?;

        self.executed.retain(|&i| i != index);
        self.executed.push(index);

        self.tools[index].execute(arguments).await
    }

    /// Sources from the most recently executed tool that produced any.
    pub fn get_last_sources(&self) -> Vec<String> {
        self.executed
            .iter()
            .rev()
            .map(|&i| self.tools[i].last_sources())
            .find(|sources| !sources.is_empty())
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    /// Clear the sources held by every tool.
    pub fn reset_sources(&mut self) {
        for tool in &mut self.tools {
            tool.reset_sources();
        }
        self.executed.clear();
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tools.iter().position(|t| t.definition().name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    /// Echoes its arguments and reports a fixed list of sources.
    struct EchoTool {
        name: &'static str,
        sources: Vec<String>,
        emits: Vec<String>,
    }

    impl EchoTool {
        fn new(name: &'static str, emits: &[&str]) -> Self {
            Self {
                name,
                sources: Vec::new(),
                emits: emits.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name.to_string(),
                description: format!("{} tool", self.name),
                input_schema: json!({"type": "object", "properties": {}}),
            }
        }

        async fn execute(&mut self, arguments: &Value) -> Result<String> {
            self.sources = self.emits.clone();
            Ok(format!("{}:{}", self.name, arguments))
        }

        fn last_sources(&self) -> &[String] {
            &self.sources
        }

        fn reset_sources(&mut self) {
            self.sources.clear();
        }
    }

    #[test]
    fn test_definitions_follow_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("beta", &[]));
        registry.register(EchoTool::new("alpha", &[]));

        let names: Vec<_> = registry
            .get_tool_definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["beta", "alpha"]);
    }

    #[tokio::test]
    async fn test_duplicate_name_replaces_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("search", &["old"]));
        registry.register(EchoTool::new("other", &[]));
        registry.register(EchoTool::new("search", &["new"]));

        assert_eq!(registry.get_tool_definitions().len(), 2);
        assert_eq!(registry.get_tool_definitions()[0].name, "search");

        registry.execute_tool("search", &json!({})).await.unwrap();
        assert_eq!(registry.get_last_sources(), vec!["new"]);
    }

    #[tokio::test]
    async fn test_execute_dispatches_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("search", &[]));

        let output = registry
            .execute_tool("search", &json!({"query": "rust"}))
            .await
            .unwrap();
        assert_eq!(output, r#"search:{"query":"rust"}"#);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error() {
        let mut registry = ToolRegistry::new();
        let err = registry.execute_tool("nope", &json!({})).await.unwrap_err();

        assert!(matches!(err, CoursemateError::ToolNotFound(ref name) if name == "nope"));
        assert_eq!(err.to_string(), "Tool 'nope' not found");
    }

    #[tokio::test]
    async fn test_last_sources_follow_most_recent_producer() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("search", &["a", "b"]));
        registry.register(EchoTool::new("quiet", &[]));
        registry.register(EchoTool::new("cite", &["c"]));

        assert!(registry.get_last_sources().is_empty());

        registry.execute_tool("search", &json!({})).await.unwrap();
        assert_eq!(registry.get_last_sources(), vec!["a", "b"]);

        // A tool that produced nothing does not hide earlier sources.
        registry.execute_tool("quiet", &json!({})).await.unwrap();
        assert_eq!(registry.get_last_sources(), vec!["a", "b"]);

        registry.execute_tool("cite", &json!({})).await.unwrap();
        assert_eq!(registry.get_last_sources(), vec!["c"]);

        registry.execute_tool("search", &json!({})).await.unwrap();
        assert_eq!(registry.get_last_sources(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_reset_sources_clears_everything() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("search", &["a"]));
        registry.execute_tool("search", &json!({})).await.unwrap();

        registry.reset_sources();
        assert!(registry.get_last_sources().is_empty());
    }
}
