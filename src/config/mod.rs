//! Configuration module for Coursemate.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{GenerationPrompts, Prompts};
pub use settings::{
    CourseSettings, EmbeddingSettings, GeneralSettings, GenerationProviderKind,
    GenerationSettings, PromptSettings, SessionSettings, Settings, VectorStoreSettings,
};
