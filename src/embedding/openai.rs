//! OpenAI embeddings for course chunks, titles and queries.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{CoursemateError, Result};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Inputs per embeddings request.
const MAX_BATCH: usize = 100;

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    pub fn new(model: &str, dimensions: usize) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            dimensions,
        }
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Self {
        Self::new(&settings.model, settings.dimensions as usize)
    }

    async fn embed_request(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = inputs.len();
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(inputs))
            .dimensions(self.dimensions as u32)
            .build()
            .map_err(|e| CoursemateError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| CoursemateError::OpenAI(format!("Embedding API error: {}", e)))?;

        let mut data = response.data;
        data.sort_by_key(|e| e.index);

        if data.len() != expected {
            return Err(CoursemateError::Embedding(format!(
                "Expected {} embeddings, got {}",
                expected,
                data.len()
            )));
        }

        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_request(vec![text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| CoursemateError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            embeddings.extend(self.embed_request(batch.to_vec()).await?);
        }
        debug!("Generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
