// Embedding provider boundary: one designated provider per deployment.
//
// Once a tenant's index is built with vectors of dimension D, every
// later call must produce dimension D. A differently-dimensioned
// fallback provider would silently break downstream distance math, so
// the contract carries a declared dimension and providers are never
// swapped mid-call.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::errors::{RetrievalError, Result};

/// What the embedding will be used for. Retrieval-tuned models encode
/// queries and documents asymmetrically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    Query,
    Document,
}

impl TaskType {
    /// Stable string form, used both as a model prompt prefix and in
    /// cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "search_query",
            Self::Document => "search_document",
        }
    }
}

/// A provider that turns text into a fixed-dimension vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text for the given task
    async fn embed(&self, text: &str, task: TaskType) -> Result<Vec<f32>>;

    /// Output dimension this provider is committed to
    fn dimension(&self) -> usize;

    /// Provider name for logs
    fn name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

/// Embedding provider backed by an Ollama-compatible HTTP API
pub struct OllamaEmbeddingProvider {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
}

impl OllamaEmbeddingProvider {
    /// Create a new provider client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the API (e.g. http://127.0.0.1:11434)
    /// * `model` - Embedding model tag (e.g. "nomic-embed-text")
    /// * `dimension` - Output dimension the model is committed to
    /// * `timeout` - Per-request timeout; a slow provider degrades, never hangs
    pub fn new(base_url: String, model: String, dimension: usize, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url,
            model,
            dimension,
        }
    }

    /// Build the provider straight from deployment configuration
    pub fn from_config(config: &crate::config::EmbeddingConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            config.dimension,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str, task: TaskType) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        // Nomic-style models expect the task prefix in the prompt itself
        let prompt = format!("{}: {}", task.as_str(), text);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "model": self.model, "prompt": prompt }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RetrievalError::ProviderError {
                provider: self.model.clone(),
                reason: format!("API error: {}", response.status()),
            });
        }

        let parsed: EmbeddingsResponse = response.json().await?;

        if parsed.embedding.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                actual: parsed.embedding.len(),
            });
        }

        Ok(parsed.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_type_strings() {
        assert_eq!(TaskType::Query.as_str(), "search_query");
        assert_eq!(TaskType::Document.as_str(), "search_document");
    }

    #[test]
    fn test_provider_declared_dimension() {
        let provider = OllamaEmbeddingProvider::new(
            "http://127.0.0.1:11434".to_string(),
            "nomic-embed-text".to_string(),
            768,
            Duration::from_secs(10),
        );
        assert_eq!(provider.dimension(), 768);
        assert_eq!(provider.name(), "nomic-embed-text");
    }
}
