//! Content search over indexed course material.

use super::{anchor, parse_arguments, Tool, ToolDefinition};
use crate::error::Result;
use crate::vector_store::{metadata_course_title, metadata_lesson_number, CourseStore, Metadata, SearchResults};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

pub const SEARCH_TOOL_NAME: &str = "search_course_content";

#[derive(Debug, Deserialize)]
struct SearchArguments {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default)]
    lesson_number: Option<u32>,
}

/// Searches course content and records a citation for every match.
pub struct CourseSearchTool {
    store: Arc<dyn CourseStore>,
    last_sources: Vec<String>,
}

impl CourseSearchTool {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self {
            store,
            last_sources: Vec::new(),
        }
    }

    /// Search and format the matches for the model.
    pub async fn search(
        &mut self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> Result<String> {
        self.last_sources.clear();

        let results = self.store.search(query, course_name, lesson_number).await;

        if let Some(error) = results.error {
            return Ok(error);
        }

        if results.is_empty() {
            return Ok(no_content_message(course_name, lesson_number));
        }

        Ok(self.format_results(&results).await)
    }

    async fn format_results(&mut self, results: &SearchResults) -> String {
        let unknown = Metadata::new();
        let mut blocks = Vec::with_capacity(results.documents.len());
        let mut sources = Vec::with_capacity(results.documents.len());

        for (i, document) in results.documents.iter().enumerate() {
            let metadata = results.metadata.get(i).unwrap_or(&unknown);
            let title = metadata_course_title(metadata);
            let lesson = metadata_lesson_number(metadata);

            let label = match lesson {
                Some(n) => format!("{} - Lesson {}", title.unwrap_or("unknown"), n),
                None => title.unwrap_or("unknown").to_string(),
            };

            blocks.push(format!("[{}]\n{}", label, document));

            let link = match (title, lesson) {
                (Some(t), Some(n)) => match self.store.get_lesson_link(t, n).await {
                    Ok(link) => link,
                    Err(e) => {
                        warn!("Lesson link lookup failed for '{}' lesson {}: {}", t, n, e);
                        None
                    }
                },
                _ => None,
            };
            sources.push(match link {
                Some(href) => anchor(&href, &label),
                None => label,
            });
        }

        debug!("Formatted {} matches", blocks.len());
        self.last_sources = sources;
        blocks.join("\n\n")
    }
}

fn no_content_message(course_name: Option<&str>, lesson_number: Option<u32>) -> String {
    let mut message = String::from("No relevant content found");
    if let Some(course) = course_name {
        message.push_str(&format!(" in course '{}'", course));
    }
    if let Some(lesson) = lesson_number {
        message.push_str(&format!(" in lesson {}", lesson));
    }
    message.push('.');
    message
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Search course materials with smart course name matching and lesson filtering"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&mut self, arguments: &Value) -> Result<String> {
        let args: SearchArguments = parse_arguments(SEARCH_TOOL_NAME, arguments)?;
        self.search(&args.query, args.course_name.as_deref(), args.lesson_number)
            .await
    }

    fn last_sources(&self) -> &[String] {
        &self.last_sources
    }

    fn reset_sources(&mut self) {
        self.last_sources.clear();
    }
}
