//! In-memory course index.
//!
//! Useful for testing and small course sets.

use super::{CourseIndex, IndexedChunk, IndexedCourse};
use crate::error::{CoursemateError, Result};
use crate::models::Course;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory course index.
#[derive(Default)]
pub struct MemoryCourseIndex {
    courses: RwLock<BTreeMap<String, IndexedCourse>>,
    chunks: RwLock<Vec<IndexedChunk>>,
}

impl MemoryCourseIndex {
    /// Create a new in-memory index.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> CoursemateError {
    CoursemateError::VectorStore("in-memory index lock poisoned".to_string())
}

#[async_trait]
impl CourseIndex for MemoryCourseIndex {
    async fn upsert_course(&self, course: &IndexedCourse) -> Result<()> {
        let mut courses = self.courses.write().map_err(poisoned)?;
        courses.insert(course.course.title.clone(), course.clone());
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[IndexedChunk]) -> Result<usize> {
        let mut store = self.chunks.write().map_err(poisoned)?;
        for chunk in chunks {
            store.retain(|c| c.id != chunk.id);
            store.push(chunk.clone());
        }
        Ok(chunks.len())
    }

    async fn courses(&self) -> Result<Vec<IndexedCourse>> {
        let courses = self.courses.read().map_err(poisoned)?;
        Ok(courses.values().cloned().collect())
    }

    async fn course(&self, title: &str) -> Result<Option<Course>> {
        let courses = self.courses.read().map_err(poisoned)?;
        Ok(courses.get(title).map(|c| c.course.clone()))
    }

    async fn chunks(&self, course_title: Option<&str>, lesson_number: Option<u32>) -> Result<Vec<IndexedChunk>> {
        let chunks = self.chunks.read().map_err(poisoned)?;
        Ok(chunks
            .iter()
            .filter(|c| course_title.map_or(true, |t| c.chunk.course_title == t))
            .filter(|c| lesson_number.map_or(true, |n| c.chunk.lesson_number == Some(n)))
            .cloned()
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        self.courses.write().map_err(poisoned)?.clear();
        self.chunks.write().map_err(poisoned)?.clear();
        Ok(())
    }
}
