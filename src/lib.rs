//! Coursemate - answers questions about course materials
//!
//! Course documents are parsed into lessons and chunks, embedded, and
//! indexed. Questions go to a language model that may call two retrieval
//! tools (content search and course outline) for up to two rounds before
//! answering; the search tool's citations are returned with the answer.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `ingest` - Course document parsing and chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Course index and semantic search
//! - `tools` - Retrieval tools and the tool registry
//! - `generation` - Provider adapters and the bounded tool loop
//! - `session` - Per-session conversation history
//! - `rag` - Facade tying everything together
//!
//! # Example
//!
//! ```rust,no_run
//! use coursemate::config::Settings;
//! use coursemate::rag::RagSystem;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let rag = RagSystem::from_settings(&settings)?;
//!
//!     rag.add_course_folder(Path::new("docs"), false).await?;
//!     let (answer, sources) = rag.query("What does lesson 2 cover?", None).await;
//!     println!("{}\n{:?}", answer, sources);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod ingest;
pub mod models;
pub mod openai;
pub mod rag;
pub mod session;
pub mod tools;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{CoursemateError, Result};
