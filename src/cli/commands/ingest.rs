//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use anyhow::Result;
use std::path::PathBuf;

/// Index every course document in a folder.
pub async fn run_ingest(dir: Option<&str>, clear: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'coursemate doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let folder = match dir {
        Some(d) => PathBuf::from(shellexpand::tilde(d).to_string()),
        None => settings.docs_dir(),
    };

    if !folder.is_dir() {
        Output::error(&format!("Folder {} does not exist", folder.display()));
        anyhow::bail!("missing course folder: {}", folder.display());
    }

    let rag = RagSystem::from_settings(&settings)?;

    if clear {
        Output::warning("Clearing existing data for fresh rebuild...");
    }

    let spinner = Output::spinner(&format!("Indexing courses from {}...", folder.display()));
    let summary = rag.add_course_folder(&folder, clear).await;
    spinner.finish_and_clear();
    let summary = summary?;

    Output::success(&format!(
        "Added {} course(s) with {} chunk(s)",
        summary.courses_added, summary.chunks_added
    ));
    if summary.skipped > 0 {
        Output::info(&format!(
            "Skipped {} document(s) already indexed or unreadable",
            summary.skipped
        ));
    }

    Ok(())
}
