// Cache-first embedding client with single-provider degradation.
//
// A provider failure or timeout yields None, which callers must treat
// as "semantic search unavailable for this call" and fall back to
// lexical-only retrieval. There is no secondary provider: substituting
// a differently-dimensioned vector would corrupt distance math against
// the tenant's existing index.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::cache::{cache_key, TtlCache};
use crate::config::EmbeddingConfig;
use crate::embedding::provider::{EmbeddingProvider, TaskType};
use crate::errors::RetrievalError;

/// Bumped whenever the cache key layout or text normalization changes,
/// invalidating stale entries wholesale.
const EMBEDDING_SCHEMA_VERSION: u32 = 2;

/// Embedding client: memoizes provider calls and owns similarity math
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
    cache: TtlCache<Vec<f32>>,
    call_timeout: Duration,
    cache_ttl: Duration,
}

impl EmbeddingClient {
    /// Create a client around the designated provider
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: &EmbeddingConfig) -> Self {
        Self {
            provider,
            cache: TtlCache::new(config.cache_capacity),
            call_timeout: Duration::from_secs(config.timeout_secs),
            cache_ttl: Duration::from_secs(config.cache_ttl_days * 24 * 3600),
        }
    }

    /// Output dimension of the designated provider
    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    /// Embed text for the given task.
    ///
    /// Returns `None` for empty input, provider failure, timeout, or a
    /// wrong-dimension response. Identical (text, task) pairs hit the
    /// cache and issue at most one provider call.
    pub async fn embed(&self, text: &str, task: TaskType) -> Option<Vec<f32>> {
        let normalized = text.trim();
        if normalized.is_empty() {
            return None;
        }

        let key = cache_key(EMBEDDING_SCHEMA_VERSION, &[task.as_str(), normalized]);
        if let Some(vector) = self.cache.get(&key) {
            debug!(task = task.as_str(), "embedding cache hit");
            return Some(vector);
        }

        let result = match timeout(self.call_timeout, self.provider.embed(normalized, task)).await
        {
            Ok(result) => result,
            Err(_) => Err(RetrievalError::Timeout {
                duration_ms: self.call_timeout.as_millis() as u64,
            }),
        };

        match result {
            Ok(vector) => {
                if vector.len() != self.provider.dimension() {
                    warn!(
                        provider = self.provider.name(),
                        expected = self.provider.dimension(),
                        actual = vector.len(),
                        "discarding embedding with unexpected dimension"
                    );
                    return None;
                }
                self.cache.insert(key, vector.clone(), self.cache_ttl);
                Some(vector)
            }
            Err(e) => {
                warn!(
                    provider = self.provider.name(),
                    error = %e,
                    "embedding unavailable, caller degrades to keyword-only"
                );
                None
            }
        }
    }

    /// Embed a user query
    pub async fn embed_query(&self, text: &str) -> Option<Vec<f32>> {
        self.embed(text, TaskType::Query).await
    }

    /// Embed a knowledge document
    pub async fn embed_document(&self, text: &str) -> Option<Vec<f32>> {
        self.embed(text, TaskType::Document).await
    }

    /// Rank documents against a query by cosine similarity.
    ///
    /// Returns (document index, score) pairs sorted descending, at most
    /// `top_n` of them. An unavailable query embedding yields an empty
    /// list; documents that fail to embed are skipped.
    pub async fn rank(&self, query: &str, documents: &[String], top_n: usize) -> Vec<(usize, f32)> {
        let query_vector = match self.embed(query, TaskType::Query).await {
            Some(v) => v,
            None => return Vec::new(),
        };

        let mut scored = Vec::new();
        for (idx, doc) in documents.iter().enumerate() {
            if let Some(doc_vector) = self.embed(doc, TaskType::Document).await {
                scored.push((idx, cosine_similarity(&query_vector, &doc_vector)));
            }
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_n);
        scored
    }
}

/// Cosine similarity clamped to [0, 1].
///
/// Defined as 0 when either vector has zero magnitude or the dimensions
/// disagree, so degenerate inputs sort last instead of poisoning ranks.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic fake provider that counts calls
    struct FakeProvider {
        calls: AtomicUsize,
        dimension: usize,
        fail: bool,
    }

    impl FakeProvider {
        fn new(dimension: usize, fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                dimension,
                fail,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FakeProvider {
        async fn embed(&self, text: &str, _task: TaskType) -> crate::errors::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RetrievalError::ProviderError {
                    provider: "fake".to_string(),
                    reason: "down".to_string(),
                });
            }
            // Vector derived from text bytes so distinct texts differ
            let seed = text.bytes().map(|b| b as f32).sum::<f32>();
            Ok((0..self.dimension)
                .map(|i| ((seed + i as f32) % 10.0) + 1.0)
                .collect())
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn client_with(provider: Arc<FakeProvider>) -> EmbeddingClient {
        EmbeddingClient::new(provider, &EmbeddingConfig::default())
    }

    #[tokio::test]
    async fn test_empty_text_skips_provider() {
        let provider = Arc::new(FakeProvider::new(768, false));
        let client = client_with(provider.clone());

        assert!(client.embed("", TaskType::Query).await.is_none());
        assert!(client.embed("   \n\t ", TaskType::Query).await.is_none());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_memoizes_identical_calls() {
        let provider = Arc::new(FakeProvider::new(768, false));
        let client = client_with(provider.clone());

        let first = client.embed("hello world", TaskType::Query).await.unwrap();
        let second = client.embed("hello world", TaskType::Query).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_task_type_separates_cache_entries() {
        let provider = Arc::new(FakeProvider::new(768, false));
        let client = client_with(provider.clone());

        client.embed("hello", TaskType::Query).await.unwrap();
        client.embed("hello", TaskType::Document).await.unwrap();

        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_provider_failure_returns_none() {
        let provider = Arc::new(FakeProvider::new(768, true));
        let client = client_with(provider.clone());

        assert!(client.embed("hello", TaskType::Query).await.is_none());
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_rank_orders_descending() {
        let provider = Arc::new(FakeProvider::new(8, false));
        let client = client_with(provider);

        let docs = vec![
            "alpha beta".to_string(),
            "gamma delta".to_string(),
            "epsilon".to_string(),
        ];
        let ranked = client.rank("alpha", &docs, 3).await;

        assert_eq!(ranked.len(), 3);
        for pair in ranked.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[tokio::test]
    async fn test_rank_empty_when_query_fails() {
        let provider = Arc::new(FakeProvider::new(8, true));
        let client = client_with(provider);

        let docs = vec!["doc".to_string()];
        assert!(client.rank("query", &docs, 5).await.is_empty());
    }

    #[test]
    fn test_cosine_identity() {
        let v = vec![0.3, 0.5, 0.2, 0.9];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_clamps_to_unit_interval() {
        // Opposed vectors would be -1 unclamped
        let a = vec![1.0, 1.0];
        let b = vec![-1.0, -1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
