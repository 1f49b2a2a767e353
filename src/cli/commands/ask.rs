//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::RagSystem;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'coursemate doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let rag = RagSystem::from_settings(&settings)?;

    let spinner = Output::spinner("Thinking...");
    let (answer, sources) = rag.query(question, None).await;
    spinner.finish_and_clear();

    Output::answer(&answer, &sources);
    Ok(())
}
