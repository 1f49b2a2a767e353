//! SQLite-based course index.
//!
//! Embeddings are stored as little-endian `f32` blobs and similarity is computed
//! in Rust. For large catalogs, consider the sqlite-vec extension or a dedicated
//! vector database.

use super::{CourseIndex, IndexedChunk, IndexedCourse};
use crate::error::{CoursemateError, Result};
use crate::models::{Course, CourseChunk, Lesson};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS courses (
        title TEXT PRIMARY KEY,
        course_link TEXT,
        instructor TEXT,
        lessons_json TEXT NOT NULL,
        title_embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS chunks (
        id TEXT PRIMARY KEY,
        course_title TEXT NOT NULL,
        lesson_number INTEGER,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_course ON chunks(course_title);
    CREATE INDEX IF NOT EXISTS idx_chunks_lesson ON chunks(course_title, lesson_number);
"#;

/// SQLite-based course index.
pub struct SqliteCourseIndex {
    conn: Mutex<Connection>,
}

impl SqliteCourseIndex {
    /// Open (or create) an index at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite course index at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite index (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CoursemateError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }
}

#[async_trait]
impl CourseIndex for SqliteCourseIndex {
    #[instrument(skip(self, entry), fields(title = %entry.course.title))]
    async fn upsert_course(&self, entry: &IndexedCourse) -> Result<()> {
        let conn = self.lock()?;
        let lessons_json = serde_json::to_string(&entry.course.lessons)?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO courses
            (title, course_link, instructor, lessons_json, title_embedding, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.course.title,
                entry.course.course_link,
                entry.course.instructor,
                lessons_json,
                Self::embedding_to_bytes(&entry.title_embedding),
                Utc::now().to_rfc3339(),
            ],
        )?;

        debug!("Upserted course {}", entry.course.title);
        Ok(())
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn upsert_chunks(&self, chunks: &[IndexedChunk]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for indexed in chunks {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO chunks
                (id, course_title, lesson_number, chunk_index, content, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    indexed.id.to_string(),
                    indexed.chunk.course_title,
                    indexed.chunk.lesson_number,
                    indexed.chunk.chunk_index as i64,
                    indexed.chunk.content,
                    Self::embedding_to_bytes(&indexed.embedding),
                    indexed.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Batch upserted {} chunks", chunks.len());
        Ok(chunks.len())
    }

    async fn courses(&self) -> Result<Vec<IndexedCourse>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT title, course_link, instructor, lessons_json, title_embedding
            FROM courses
            ORDER BY title
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let lessons_json: String = row.get(3)?;
            let embedding_bytes: Vec<u8> = row.get(4)?;
            Ok((
                Course {
                    title: row.get(0)?,
                    course_link: row.get(1)?,
                    instructor: row.get(2)?,
                    lessons: Vec::new(),
                },
                lessons_json,
                embedding_bytes,
            ))
        })?;

        let mut courses = Vec::new();
        for row in rows {
            let (mut course, lessons_json, embedding_bytes) = row?;
            course.lessons = serde_json::from_str::<Vec<Lesson>>(&lessons_json)?;
            courses.push(IndexedCourse {
                course,
                title_embedding: Self::bytes_to_embedding(&embedding_bytes),
            });
        }
        Ok(courses)
    }

    async fn course(&self, title: &str) -> Result<Option<Course>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT title, course_link, instructor, lessons_json FROM courses WHERE title = ?1",
                params![title],
                |row| {
                    Ok((
                        Course {
                            title: row.get(0)?,
                            course_link: row.get(1)?,
                            instructor: row.get(2)?,
                            lessons: Vec::new(),
                        },
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((mut course, lessons_json)) => {
                course.lessons = serde_json::from_str(&lessons_json)?;
                Ok(Some(course))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn chunks(&self, course_title: Option<&str>, lesson_number: Option<u32>) -> Result<Vec<IndexedChunk>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, course_title, lesson_number, chunk_index, content, embedding, indexed_at
            FROM chunks
            WHERE (?1 IS NULL OR course_title = ?1)
              AND (?2 IS NULL OR lesson_number = ?2)
            ORDER BY course_title, chunk_index
            "#,
        )?;

        let rows = stmt.query_map(params![course_title, lesson_number], |row| {
            let id: String = row.get(0)?;
            let chunk_index: i64 = row.get(3)?;
            let embedding_bytes: Vec<u8> = row.get(5)?;
            let indexed_at: String = row.get(6)?;

            Ok(IndexedChunk {
                id: uuid::Uuid::parse_str(&id).unwrap_or_default(),
                chunk: CourseChunk {
                    course_title: row.get(1)?,
                    lesson_number: row.get(2)?,
                    chunk_index: chunk_index.max(0) as usize,
                    content: row.get(4)?,
                },
                embedding: Self::bytes_to_embedding(&embedding_bytes),
                indexed_at: Self::parse_timestamp(&indexed_at),
            })
        })?;

        let chunks: Vec<IndexedChunk> = rows.collect::<std::result::Result<_, _>>()?;
        debug!("Loaded {} candidate chunks", chunks.len());
        Ok(chunks)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("DELETE FROM chunks; DELETE FROM courses;")?;
        info!("Cleared course index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_course() -> IndexedCourse {
        IndexedCourse {
            course: Course {
                title: "AI Fundamentals".to_string(),
                course_link: Some("https://example.com/course".to_string()),
                instructor: Some("Dr. Smith".to_string()),
                lessons: vec![Lesson {
                    lesson_number: 1,
                    title: "Introduction to AI".to_string(),
                    lesson_link: Some("https://example.com/lesson1".to_string()),
                }],
            },
            title_embedding: vec![0.5, 0.25, -1.0],
        }
    }

    #[tokio::test]
    async fn test_sqlite_course_index() {
        let dir = tempfile::tempdir().unwrap();
        let index = SqliteCourseIndex::new(&dir.path().join("courses.db")).unwrap();

        index.upsert_course(&sample_course()).await.unwrap();

        let chunks: Vec<IndexedChunk> = (0..3)
            .map(|i| {
                IndexedChunk::new(
                    CourseChunk {
                        content: format!("content {}", i),
                        course_title: "AI Fundamentals".to_string(),
                        lesson_number: if i == 2 { None } else { Some(1) },
                        chunk_index: i,
                    },
                    vec![i as f32, 1.0],
                )
            })
            .collect();
        assert_eq!(index.upsert_chunks(&chunks).await.unwrap(), 3);

        let courses = index.courses().await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].title_embedding, vec![0.5, 0.25, -1.0]);
        assert_eq!(courses[0].course.lessons.len(), 1);

        let course = index.course("AI Fundamentals").await.unwrap().unwrap();
        assert_eq!(course.instructor.as_deref(), Some("Dr. Smith"));
        assert!(index.course("Missing").await.unwrap().is_none());

        assert_eq!(index.chunks(None, None).await.unwrap().len(), 3);
        let lesson_one = index.chunks(Some("AI Fundamentals"), Some(1)).await.unwrap();
        assert_eq!(lesson_one.len(), 2);
        assert_eq!(lesson_one[1].embedding, vec![1.0, 1.0]);
        assert!(index.chunks(Some("Other"), None).await.unwrap().is_empty());

        index.clear().await.unwrap();
        assert!(index.courses().await.unwrap().is_empty());
        assert!(index.chunks(None, None).await.unwrap().is_empty());
    }
}
