//! Course outline lookup.

use super::{anchor, parse_arguments, Tool, ToolDefinition};
use crate::error::Result;
use crate::models::Course;
use crate::vector_store::CourseStore;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

#[derive(Debug, Deserialize)]
struct OutlineArguments {
    course_name: String,
}

/// Renders a course's title, instructor, link and lesson list.
pub struct CourseOutlineTool {
    store: Arc<dyn CourseStore>,
}

impl CourseOutlineTool {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self { store }
    }

    pub async fn outline(&self, course_name: &str) -> Result<String> {
        let course = match self.store.resolve_course_name(course_name).await? {
            Some(title) => self.store.get_course(&title).await?,
            None => None,
        };

        Ok(match course {
            Some(course) => render_outline(&course),
            None => format!("No course found matching '{}'.", course_name),
        })
    }
}

fn render_outline(course: &Course) -> String {
    let mut lines = vec![format!("**Course:** {}", course.title)];

    if let Some(instructor) = &course.instructor {
        lines.push(format!("**Instructor:** {}", instructor));
    }
    if let Some(link) = &course.course_link {
        lines.push(format!("**Course Link:** {}", anchor(link, link)));
    }
    lines.push(format!("**Total Lessons:** {}", course.lessons.len()));

    if !course.lessons.is_empty() {
        lines.push(String::new());
        lines.push("**Lesson Structure:**".to_string());
        for lesson in &course.lessons {
            let title = match &lesson.lesson_link {
                Some(link) => anchor(link, &lesson.title),
                None => lesson.title.clone(),
            };
            lines.push(format!("{}. {}", lesson.lesson_number, title));
        }
    }

    lines.join("\n")
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: OUTLINE_TOOL_NAME.to_string(),
            description: "Get course outline including title, course link, and complete lesson list"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    }
                },
                "required": ["course_name"]
            }),
        }
    }

    async fn execute(&mut self, arguments: &Value) -> Result<String> {
        let args: OutlineArguments = parse_arguments(OUTLINE_TOOL_NAME, arguments)?;
        self.outline(&args.course_name).await
    }
}
