use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tuning constants for hybrid rank fusion.
///
/// These are operator-tunable deployment constants, not per-request
/// parameters. Tests perturb them through this struct instead of
/// touching the fusion code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Weight applied to the cosine-similarity score
    pub vector_weight: f32,
    /// Weight applied to the keyword-relevance score
    pub keyword_weight: f32,
    /// Weight applied to the reciprocal-rank-fusion score
    pub rrf_weight: f32,
    /// RRF smoothing constant; higher values flatten rank influence
    pub rrf_k: f32,
    /// Vector candidates below this similarity are discarded
    pub min_vector_similarity: f32,
    /// Keyword candidates below this score are discarded
    pub min_keyword_score: f32,
    /// Each search axis fetches top_k * this multiplier candidates
    pub candidate_multiplier: usize,
    /// Minimum remaining budget (tokens) worth truncating a passage for
    pub min_tail_tokens: usize,
    /// Per-call timeout for search backends; a timeout degrades like a
    /// backend failure
    pub search_timeout_secs: u64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            vector_weight: 0.6,
            keyword_weight: 0.4,
            rrf_weight: 0.2,
            rrf_k: 60.0,
            min_vector_similarity: 0.1,
            min_keyword_score: 0.05,
            candidate_multiplier: 3,
            min_tail_tokens: 100,
            search_timeout_secs: 5,
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding provider API
    pub base_url: String,
    /// Model tag used for embedding requests
    pub model: String,
    /// Output dimension the provider is committed to
    pub dimension: usize,
    /// Per-call timeout in seconds; a timeout degrades like a failure
    pub timeout_secs: u64,
    /// Cached vectors expire after this many days
    pub cache_ttl_days: u64,
    /// Maximum cached vectors held in memory
    pub cache_capacity: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimension: 768,
            timeout_secs: 10,
            cache_ttl_days: 30,
            cache_capacity: 50_000,
        }
    }
}

/// Query router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Tenant override tables are cached for this many seconds
    pub override_cache_ttl_secs: u64,
    /// Maximum cached per-tenant routing tables
    pub cache_capacity: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            override_cache_ttl_secs: 3600,
            cache_capacity: 1_000,
        }
    }
}

/// Top-level configuration for the retrieval core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub fusion: FusionConfig,
    pub embedding: EmbeddingConfig,
    pub router: RouterConfig,
}

impl CoreConfig {
    /// Load configuration from a TOML file
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: CoreConfig =
            toml::from_str(contents).context("Failed to parse config file")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fusion_defaults() {
        let config = FusionConfig::default();
        assert_eq!(config.vector_weight, 0.6);
        assert_eq!(config.keyword_weight, 0.4);
        assert_eq!(config.rrf_weight, 0.2);
        assert_eq!(config.rrf_k, 60.0);
        assert_eq!(config.candidate_multiplier, 3);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            [fusion]
            rrf_k = 90.0

            [embedding]
            model = "mxbai-embed-large"
            dimension = 1024
        "#;

        let config = CoreConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.fusion.rrf_k, 90.0);
        // Unspecified fields fall back to defaults
        assert_eq!(config.fusion.vector_weight, 0.6);
        assert_eq!(config.embedding.dimension, 1024);
        assert_eq!(config.router.override_cache_ttl_secs, 3600);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config.embedding.dimension, 768);
        assert_eq!(config.embedding.cache_ttl_days, 30);
    }
}
