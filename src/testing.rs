//! Test doubles shared across module tests.

use crate::embedding::Embedder;
use crate::error::{CoursemateError, Result};
use crate::generation::{
    ContentBlock, GenerationProvider, GenerationRequest, GenerationResponse, StopKind,
    ToolCallRequest,
};
use crate::models::{Course, CourseChunk, Lesson};
use crate::vector_store::{CourseStore, Metadata, SearchResults};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

const KEYWORD_DIMS: usize = 256;

/// Deterministic bag-of-words embedder: each lowercase word bumps one hashed bucket.
pub struct KeywordEmbedder {
    dims: usize,
}

impl Default for KeywordEmbedder {
    fn default() -> Self {
        Self { dims: KEYWORD_DIMS }
    }
}

impl KeywordEmbedder {
    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dims];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
            vector[(hash % self.dims as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

pub fn sample_course() -> Course {
    Course {
        title: "AI Fundamentals".to_string(),
        course_link: Some("https://example.com/course".to_string()),
        instructor: Some("Dr. Smith".to_string()),
        lessons: vec![
            Lesson {
                lesson_number: 1,
                title: "Introduction to AI".to_string(),
                lesson_link: Some("https://example.com/lesson1".to_string()),
            },
            Lesson {
                lesson_number: 2,
                title: "Machine Learning Basics".to_string(),
                lesson_link: Some("https://example.com/lesson2".to_string()),
            },
        ],
    }
}

/// Search results from `(document, metadata)` pairs with made-up distances.
pub fn results_with(rows: &[(&str, Value)]) -> SearchResults {
    SearchResults::new(
        rows.iter().map(|(doc, _)| doc.to_string()).collect(),
        rows.iter()
            .map(|(_, meta)| meta.as_object().cloned().unwrap_or_else(Metadata::new))
            .collect(),
        (0..rows.len()).map(|i| 0.1 * (i + 1) as f32).collect(),
    )
}

pub fn text_response(text: &str) -> GenerationResponse {
    GenerationResponse {
        content: vec![ContentBlock::Text {
            text: text.to_string(),
        }],
        stop: StopKind::FinalText,
    }
}

pub fn tool_response(calls: &[(&str, &str, Value)]) -> GenerationResponse {
    GenerationResponse {
        content: calls
            .iter()
            .map(|(id, name, arguments)| {
                ContentBlock::ToolUse(ToolCallRequest {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments: arguments.clone(),
                })
            })
            .collect(),
        stop: StopKind::ToolRequest,
    }
}

/// Replays canned responses and records every request it receives.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<GenerationResponse>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<GenerationResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CoursemateError::Generation("script exhausted".to_string())))
    }
}

type SearchCall = (String, Option<String>, Option<u32>);

/// In-memory `CourseStore` with scripted search results.
///
/// Course names resolve by case-insensitive substring match.
#[derive(Default)]
pub struct StubCourseStore {
    courses: Mutex<Vec<Course>>,
    chunks: Mutex<Vec<CourseChunk>>,
    search_results: Mutex<VecDeque<SearchResults>>,
    lesson_links: HashMap<(String, u32), String>,
    lesson_link_error: Option<String>,
    search_calls: Mutex<Vec<SearchCall>>,
}

impl StubCourseStore {
    pub fn with_course(self, course: Course) -> Self {
        self.courses.lock().unwrap().push(course);
        self
    }

    /// Queue results for the next search; an empty queue yields no matches.
    pub fn with_search_results(self, results: SearchResults) -> Self {
        self.search_results.lock().unwrap().push_back(results);
        self
    }

    pub fn with_lesson_link(mut self, course_title: &str, lesson_number: u32, link: &str) -> Self {
        self.lesson_links
            .insert((course_title.to_string(), lesson_number), link.to_string());
        self
    }

    /// Make every lesson link lookup fail with a store error.
    pub fn with_lesson_link_error(mut self, message: &str) -> Self {
        self.lesson_link_error = Some(message.to_string());
        self
    }

    pub fn search_calls(&self) -> Vec<SearchCall> {
        self.search_calls.lock().unwrap().clone()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }
}

#[async_trait]
impl CourseStore for StubCourseStore {
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> SearchResults {
        self.search_calls.lock().unwrap().push((
            query.to_string(),
            course_name.map(str::to_string),
            lesson_number,
        ));
        self.search_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default()
    }

    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        if let Some(message) = &self.lesson_link_error {
            return Err(CoursemateError::VectorStore(message.clone()));
        }
        if let Some(link) = self
            .lesson_links
            .get(&(course_title.to_string(), lesson_number))
        {
            return Ok(Some(link.clone()));
        }
        Ok(self
            .courses
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.title == course_title)
            .and_then(|c| c.lesson(lesson_number))
            .and_then(|l| l.lesson_link.clone()))
    }

    async fn resolve_course_name(&self, course_name: &str) -> Result<Option<String>> {
        let wanted = course_name.to_lowercase();
        Ok(self
            .courses
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.title.to_lowercase().contains(&wanted))
            .map(|c| c.title.clone()))
    }

    async fn get_course(&self, course_title: &str) -> Result<Option<Course>> {
        Ok(self
            .courses
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.title == course_title)
            .cloned())
    }

    async fn add_course_metadata(&self, course: &Course) -> Result<()> {
        let mut courses = self.courses.lock().unwrap();
        courses.retain(|c| c.title != course.title);
        courses.push(course.clone());
        Ok(())
    }

    async fn add_course_content(&self, chunks: &[CourseChunk]) -> Result<usize> {
        self.chunks.lock().unwrap().extend_from_slice(chunks);
        Ok(chunks.len())
    }

    async fn existing_course_titles(&self) -> Result<Vec<String>> {
        Ok(self
            .courses
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.title.clone())
            .collect())
    }

    async fn course_count(&self) -> Result<usize> {
        Ok(self.courses.lock().unwrap().len())
    }

    async fn clear_all_data(&self) -> Result<()> {
        self.courses.lock().unwrap().clear();
        self.chunks.lock().unwrap().clear();
        Ok(())
    }
}
