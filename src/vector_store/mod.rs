//! Course retrieval for Coursemate.
//!
//! [`CourseStore`] is the contract the retrieval tools depend on. [`VectorStore`]
//! implements it on top of an [`Embedder`](crate::embedding::Embedder) and a
//! [`CourseIndex`] storage backend (SQLite or in-memory).

mod memory;
mod results;
mod sqlite;
mod store;

pub use memory::MemoryCourseIndex;
pub use results::{metadata_course_title, metadata_lesson_number, Metadata, SearchResults};
pub use sqlite::SqliteCourseIndex;
pub use store::VectorStore;

use crate::error::Result;
use crate::models::{Course, CourseChunk};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Semantic search over course content plus course catalog lookups.
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Search course content, optionally restricted to a course and/or lesson.
    ///
    /// Failures are reported through [`SearchResults::error`], never as `Err`.
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> SearchResults;

    /// Link for a lesson of a course, if one is recorded.
    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>>;

    /// Best-effort fuzzy match of a course name to an indexed course title.
    async fn resolve_course_name(&self, course_name: &str) -> Result<Option<String>>;

    /// Full course metadata by exact title.
    async fn get_course(&self, course_title: &str) -> Result<Option<Course>>;

    /// Index a course's catalog entry.
    async fn add_course_metadata(&self, course: &Course) -> Result<()>;

    /// Index content chunks, returning how many were stored.
    async fn add_course_content(&self, chunks: &[CourseChunk]) -> Result<usize>;

    /// Titles of every indexed course.
    async fn existing_course_titles(&self) -> Result<Vec<String>>;

    /// Number of indexed courses.
    async fn course_count(&self) -> Result<usize>;

    /// Remove every course and chunk.
    async fn clear_all_data(&self) -> Result<()>;
}

/// A content chunk with its embedding, as held by a storage backend.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub id: Uuid,
    pub chunk: CourseChunk,
    pub embedding: Vec<f32>,
    pub indexed_at: DateTime<Utc>,
}

impl IndexedChunk {
    pub fn new(chunk: CourseChunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            chunk,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A catalog entry: the course plus the embedding of its title.
#[derive(Debug, Clone)]
pub struct IndexedCourse {
    pub course: Course,
    pub title_embedding: Vec<f32>,
}

/// Storage backend for embedded courses and chunks.
#[async_trait]
pub trait CourseIndex: Send + Sync {
    /// Insert or replace a catalog entry keyed by course title.
    async fn upsert_course(&self, course: &IndexedCourse) -> Result<()>;

    /// Bulk insert chunks.
    async fn upsert_chunks(&self, chunks: &[IndexedChunk]) -> Result<usize>;

    /// Every catalog entry, ordered by title.
    async fn courses(&self) -> Result<Vec<IndexedCourse>>;

    /// One catalog entry by exact title.
    async fn course(&self, title: &str) -> Result<Option<Course>>;

    /// Chunks matching the optional course and lesson filters.
    async fn chunks(&self, course_title: Option<&str>, lesson_number: Option<u32>) -> Result<Vec<IndexedChunk>>;

    /// Remove everything.
    async fn clear(&self) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }
}
