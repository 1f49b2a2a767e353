//! Top-level facade tying retrieval, tools, generation and sessions together.

use crate::config::{CourseSettings, Prompts, Settings};
use crate::embedding::OpenAIEmbedder;
use crate::error::{CoursemateError, Result};
use crate::generation::{provider_from_settings, AiGenerator};
use crate::ingest::load_course_document;
use crate::models::{Course, CourseChunk};
use crate::session::SessionManager;
use crate::tools::{CourseOutlineTool, CourseSearchTool, ToolRegistry};
use crate::vector_store::{CourseIndex, CourseStore, MemoryCourseIndex, SqliteCourseIndex, VectorStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// File extensions picked up when ingesting a folder.
const COURSE_EXTENSIONS: &[&str] = &["txt", "md"];

/// Catalog summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// Outcome of a folder ingest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub courses_added: usize,
    pub chunks_added: usize,
    pub skipped: usize,
}

pub struct RagSystem {
    store: Arc<dyn CourseStore>,
    generator: AiGenerator,
    sessions: SessionManager,
    prompts: Prompts,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RagSystem {
    pub fn new(
        store: Arc<dyn CourseStore>,
        generator: AiGenerator,
        sessions: SessionManager,
        prompts: Prompts,
    ) -> Self {
        let courses = CourseSettings::default();
        Self {
            store,
            generator,
            sessions,
            prompts,
            chunk_size: courses.chunk_size,
            chunk_overlap: courses.chunk_overlap,
        }
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    /// Assemble the system from configuration.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let index: Arc<dyn CourseIndex> = match settings.vector_store.provider.as_str() {
            "sqlite" => Arc::new(SqliteCourseIndex::new(&settings.sqlite_path())?),
            "memory" => Arc::new(MemoryCourseIndex::new()),
            other => {
                return Err(CoursemateError::Config(format!(
                    "Unknown vector store provider: {}",
                    other
                )))
            }
        };

        let store = Arc::new(VectorStore::new(
            index,
            Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)),
            settings.vector_store.max_results,
        ));

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let generator = AiGenerator::new(
            provider_from_settings(&settings.generation)?,
            settings.generation.model.clone(),
        )
        .with_system_prompt(prompts.system_instruction());

        Ok(Self::new(
            store,
            generator,
            SessionManager::new(settings.session.max_history),
            prompts,
        )
        .with_chunking(settings.courses.chunk_size, settings.courses.chunk_overlap))
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn store(&self) -> &Arc<dyn CourseStore> {
        &self.store
    }

    /// Answer a question, returning the answer and its citations.
    ///
    /// Each call gets its own tool registry so concurrent queries never
    /// see each other's sources.
    #[instrument(skip(self))]
    pub async fn query(&self, query: &str, session_id: Option<&str>) -> (String, Vec<String>) {
        let prompt = self.prompts.render_query(query);
        let history = session_id.and_then(|id| self.sessions.get_conversation_history(id));

        let mut registry = ToolRegistry::new();
        registry.register(CourseSearchTool::new(self.store.clone()));
        registry.register(CourseOutlineTool::new(self.store.clone()));
        let definitions = registry.get_tool_definitions();

        let answer = self
            .generator
            .generate(&prompt, history.as_deref(), Some(&definitions), Some(&mut registry))
            .await;

        let sources = registry.get_last_sources();
        registry.reset_sources();

        if let Some(id) = session_id {
            self.sessions.add_exchange(id, query, &answer);
        }

        (answer, sources)
    }

    /// Parse one course document and index it.
    pub async fn add_course_document(&self, path: &Path) -> Result<(Course, usize)> {
        let (course, chunks) = self.load(path).await?;
        self.store.add_course_metadata(&course).await?;
        let added = self.store.add_course_content(&chunks).await?;
        Ok((course, added))
    }

    /// Index every course document in a folder, skipping titles already indexed.
    #[instrument(skip(self))]
    pub async fn add_course_folder(&self, folder: &Path, clear_existing: bool) -> Result<IngestSummary> {
        let mut summary = IngestSummary::default();

        if !folder.is_dir() {
            warn!("Folder {:?} does not exist", folder);
            return Ok(summary);
        }

        if clear_existing {
            info!("Clearing existing data for fresh rebuild");
            self.store.clear_all_data().await?;
        }

        let mut existing: HashSet<String> =
            self.store.existing_course_titles().await?.into_iter().collect();

        let mut paths: Vec<_> = std::fs::read_dir(folder)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_course_file(p))
            .collect();
        paths.sort();

        for path in paths {
            let (course, chunks) = match self.load(&path).await {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Error processing course document {:?}: {}", path, e);
                    summary.skipped += 1;
                    continue;
                }
            };

            if existing.contains(&course.title) {
                info!("Course already exists: {} - skipping", course.title);
                summary.skipped += 1;
                continue;
            }

            self.store.add_course_metadata(&course).await?;
            let added = self.store.add_course_content(&chunks).await?;
            info!("Added new course: {} ({} chunks)", course.title, added);

            summary.courses_added += 1;
            summary.chunks_added += added;
            existing.insert(course.title);
        }

        Ok(summary)
    }

    pub async fn course_analytics(&self) -> Result<CourseAnalytics> {
        Ok(CourseAnalytics {
            total_courses: self.store.course_count().await?,
            course_titles: self.store.existing_course_titles().await?,
        })
    }

    async fn load(&self, path: &Path) -> Result<(Course, Vec<CourseChunk>)> {
        let path = path.to_path_buf();
        let (size, overlap) = (self.chunk_size, self.chunk_overlap);
        tokio::task::spawn_blocking(move || load_course_document(&path, size, overlap))
            .await
            .map_err(|e| CoursemateError::Ingestion(e.to_string()))?
    }
}

fn is_course_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| COURSE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}
