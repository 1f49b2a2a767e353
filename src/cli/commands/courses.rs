//! Courses command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::vector_store::{CourseStore, SqliteCourseIndex, VectorStore};
use anyhow::Result;
use std::sync::Arc;

/// List indexed courses with their lessons.
pub async fn run_courses(settings: Settings) -> Result<()> {
    preflight::check(Operation::Courses, &settings)?;

    let db_path = settings.sqlite_path();
    if !db_path.exists() {
        Output::info("No courses indexed yet. Run 'coursemate ingest <dir>' first.");
        return Ok(());
    }

    // Listing never embeds, so no API key is required here.
    let store = VectorStore::new(
        Arc::new(SqliteCourseIndex::new(&db_path)?),
        Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)),
        settings.vector_store.max_results,
    );

    let titles = store.existing_course_titles().await?;
    if titles.is_empty() {
        Output::info("No courses indexed yet. Run 'coursemate ingest <dir>' first.");
        return Ok(());
    }

    Output::header(&format!("Indexed courses ({})", titles.len()));
    for title in titles {
        Output::list_item(&title);
        if let Some(course) = store.get_course(&title).await? {
            if let Some(instructor) = &course.instructor {
                Output::kv("Instructor", instructor);
            }
            Output::kv("Lessons", &course.lessons.len().to_string());
        }
    }
    println!();

    Ok(())
}
