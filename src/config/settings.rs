//! Configuration settings for Coursemate.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub generation: GenerationSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub courses: CourseSettings,
    pub session: SessionSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.coursemate".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Which LLM backend answers questions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProviderKind {
    /// Anthropic Messages API.
    #[default]
    Anthropic,
    /// OpenAI chat completions.
    OpenAI,
}

impl GenerationProviderKind {
    /// Environment variable holding the API key for this provider.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            GenerationProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            GenerationProviderKind::OpenAI => "OPENAI_API_KEY",
        }
    }
}

impl std::str::FromStr for GenerationProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(GenerationProviderKind::Anthropic),
            "openai" => Ok(GenerationProviderKind::OpenAI),
            _ => Err(format!("Unknown generation provider: {}", s)),
        }
    }
}

impl std::fmt::Display for GenerationProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationProviderKind::Anthropic => write!(f, "anthropic"),
            GenerationProviderKind::OpenAI => write!(f, "openai"),
        }
    }
}

/// Answer generation settings.
///
/// Temperature, output length and the tool round budget are constants in
/// [`crate::generation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Provider backend.
    pub provider: GenerationProviderKind,
    /// Model identifier sent with every request.
    pub model: String,
    /// Override for the provider's API base URL.
    pub api_base: Option<String>,
    /// HTTP timeout for a single generation request.
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: GenerationProviderKind::Anthropic,
            model: "claude-sonnet-4-20250514".to_string(),
            api_base: None,
            timeout_secs: 300,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
    /// Maximum number of matches returned by a content search.
    pub max_results: usize,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.coursemate/courses.db".to_string(),
            max_results: 5,
        }
    }
}

/// Course document settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseSettings {
    /// Directory scanned by `ingest` and the server on startup.
    pub docs_dir: String,
    /// Maximum characters per content chunk.
    pub chunk_size: usize,
    /// Characters carried over between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for CourseSettings {
    fn default() -> Self {
        Self {
            docs_dir: "~/.coursemate/docs".to_string(),
            chunk_size: 800,
            chunk_overlap: 100,
        }
    }
}

/// Conversation session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Number of question/answer exchanges remembered per session.
    pub max_history: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { max_history: 2 }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::CoursemateError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("coursemate")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    /// Get the expanded course documents directory.
    pub fn docs_dir(&self) -> PathBuf {
        Self::expand_path(&self.courses.docs_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [generation]
            provider = "openai"
            model = "gpt-4o-mini"

            [session]
            max_history = 5
            "#,
        )
        .unwrap();

        assert_eq!(settings.generation.provider, GenerationProviderKind::OpenAI);
        assert_eq!(settings.generation.model, "gpt-4o-mini");
        assert_eq!(settings.generation.timeout_secs, 300);
        assert_eq!(settings.session.max_history, 5);
        assert_eq!(settings.vector_store.max_results, 5);
        assert_eq!(settings.courses.chunk_size, 800);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!(
            "Claude".parse::<GenerationProviderKind>().unwrap(),
            GenerationProviderKind::Anthropic
        );
        assert_eq!(
            "openai".parse::<GenerationProviderKind>().unwrap(),
            GenerationProviderKind::OpenAI
        );
        assert!("mistral".parse::<GenerationProviderKind>().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.vector_store.max_results = 9;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.vector_store.max_results, 9);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.generation.provider, GenerationProviderKind::Anthropic);
    }
}
