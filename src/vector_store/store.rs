//! Embedding-backed implementation of the retrieval contract.

use super::{cosine_similarity, CourseIndex, CourseStore, IndexedChunk, IndexedCourse, Metadata, SearchResults};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::models::{Course, CourseChunk};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Minimum title similarity for a fuzzy course-name match.
const MIN_COURSE_MATCH_SCORE: f32 = 0.3;

/// Course retrieval over an embedder and a storage backend.
pub struct VectorStore {
    index: Arc<dyn CourseIndex>,
    embedder: Arc<dyn Embedder>,
    max_results: usize,
}

impl VectorStore {
    /// Create a new vector store.
    pub fn new(index: Arc<dyn CourseIndex>, embedder: Arc<dyn Embedder>, max_results: usize) -> Self {
        Self {
            index,
            embedder,
            max_results,
        }
    }

    async fn search_chunks(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> Result<SearchResults> {
        let course_title = match course_name {
            Some(name) => match self.resolve_course_name(name).await? {
                Some(title) => Some(title),
                None => return Ok(SearchResults::empty(format!("No course found matching '{}'", name))),
            },
            None => None,
        };

        let query_embedding = self.embedder.embed(query).await?;
        let candidates = self.index.chunks(course_title.as_deref(), lesson_number).await?;

        let mut scored: Vec<(f32, IndexedChunk)> = candidates
            .into_iter()
            .map(|c| (cosine_similarity(&query_embedding, &c.embedding), c))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.max_results);

        debug!("Search matched {} chunks", scored.len());

        let mut results = SearchResults::default();
        for (score, indexed) in scored {
            results.metadata.push(chunk_metadata(&indexed.chunk));
            results.distances.push(1.0 - score);
            results.documents.push(indexed.chunk.content);
        }
        Ok(results)
    }
}

fn chunk_metadata(chunk: &CourseChunk) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("course_title".to_string(), json!(chunk.course_title));
    if let Some(n) = chunk.lesson_number {
        metadata.insert("lesson_number".to_string(), json!(n));
    }
    metadata.insert("chunk_index".to_string(), Value::from(chunk.chunk_index as u64));
    metadata
}

#[async_trait]
impl CourseStore for VectorStore {
    #[instrument(skip(self))]
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> SearchResults {
        match self.search_chunks(query, course_name, lesson_number).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Search failed: {}", e);
                SearchResults::empty(format!("Search error: {}", e))
            }
        }
    }

    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        Ok(self
            .index
            .course(course_title)
            .await?
            .and_then(|c| c.lesson(lesson_number).and_then(|l| l.lesson_link.clone())))
    }

    #[instrument(skip(self))]
    async fn resolve_course_name(&self, course_name: &str) -> Result<Option<String>> {
        let courses = self.index.courses().await?;
        if courses.is_empty() {
            return Ok(None);
        }

        let wanted = course_name.trim();
        if let Some(exact) = courses.iter().find(|c| c.course.title.eq_ignore_ascii_case(wanted)) {
            return Ok(Some(exact.course.title.clone()));
        }

        let name_embedding = self.embedder.embed(wanted).await?;
        let best = courses
            .iter()
            .map(|c| (cosine_similarity(&name_embedding, &c.title_embedding), &c.course.title))
            .filter(|(score, _)| *score >= MIN_COURSE_MATCH_SCORE)
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        debug!("Resolved '{}' to {:?}", course_name, best);
        Ok(best.map(|(_, title)| title.clone()))
    }

    async fn get_course(&self, course_title: &str) -> Result<Option<Course>> {
        self.index.course(course_title).await
    }

    async fn add_course_metadata(&self, course: &Course) -> Result<()> {
        let title_embedding = self.embedder.embed(&course.title).await?;
        self.index
            .upsert_course(&IndexedCourse {
                course: course.clone(),
                title_embedding,
            })
            .await
    }

    async fn add_course_content(&self, chunks: &[CourseChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let indexed: Vec<IndexedChunk> = chunks
            .iter()
            .cloned()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk::new(chunk, embedding))
            .collect();

        self.index.upsert_chunks(&indexed).await
    }

    async fn existing_course_titles(&self) -> Result<Vec<String>> {
        Ok(self
            .index
            .courses()
            .await?
            .into_iter()
            .map(|c| c.course.title)
            .collect())
    }

    async fn course_count(&self) -> Result<usize> {
        Ok(self.index.courses().await?.len())
    }

    async fn clear_all_data(&self) -> Result<()> {
        self.index.clear().await
    }
}
