// End-to-end retrieval pipeline: route -> embed -> hybrid retrieve ->
// assemble. One invocation per inbound chat message.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::embedding::EmbeddingClient;
use crate::retrieval::{HybridRetriever, RetrievalMethod, ScoredPassage};
use crate::router::{QueryRouter, QueryRouting};

/// How many passages each category slot is asked for
const PRIMARY_TOP_K: usize = 5;
const SECONDARY_TOP_K: usize = 3;

/// Final payload handed to the prompt builder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Ordered, trimmed passages from the primary category
    pub primary_context: Vec<ScoredPassage>,
    /// Ordered, trimmed passages from the secondary categories
    pub secondary_context: Vec<ScoredPassage>,
    pub total_chunks: usize,
    /// Method that produced the primary context
    pub method: RetrievalMethod,
}

impl RetrievalResult {
    /// Whether retrieval found nothing; the prompt builder decides what
    /// an empty-context reply looks like
    pub fn is_empty(&self) -> bool {
        self.total_chunks == 0
    }
}

/// Routing decision plus the retrieved context for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub routing: QueryRouting,
    pub result: RetrievalResult,
}

/// Orchestrates router, embedding client, and hybrid retriever
pub struct RetrievalPipeline {
    router: QueryRouter,
    embeddings: EmbeddingClient,
    retriever: HybridRetriever,
}

impl RetrievalPipeline {
    /// Assemble the pipeline from its already-configured parts
    pub fn new(
        router: QueryRouter,
        embeddings: EmbeddingClient,
        retriever: HybridRetriever,
    ) -> Self {
        Self {
            router,
            embeddings,
            retriever,
        }
    }

    /// Run the full pipeline for one query.
    ///
    /// Never returns an error: routing falls back to defaults, a failed
    /// query embedding degrades retrieval to keyword-only, and total
    /// search failure yields an empty result with `total_chunks = 0`.
    pub async fn execute(&self, query: &str, tenant: &str) -> PipelineOutput {
        let routing = self.router.route(query, tenant).await;
        let query_vector = self.embeddings.embed_query(query).await;

        let primary = self
            .retriever
            .retrieve(
                query,
                tenant,
                routing.primary_source,
                query_vector.as_deref(),
                PRIMARY_TOP_K,
                routing.budgets.primary,
            )
            .await;

        let mut secondary_context = Vec::new();
        for category in &routing.secondary_sources {
            let ranked = self
                .retriever
                .retrieve(
                    query,
                    tenant,
                    *category,
                    query_vector.as_deref(),
                    SECONDARY_TOP_K,
                    routing.budgets.secondary,
                )
                .await;
            secondary_context.extend(ranked.passages);
        }

        let total_chunks = primary.passages.len() + secondary_context.len();
        info!(
            tenant,
            intent = routing.intent.as_str(),
            method = primary.method.as_str(),
            total_chunks,
            "retrieval complete"
        );

        PipelineOutput {
            routing,
            result: RetrievalResult {
                primary_context: primary.passages,
                secondary_context,
                total_chunks,
                method: primary.method,
            },
        }
    }

    pub fn embeddings(&self) -> &EmbeddingClient {
        &self.embeddings
    }
}

/// Convenience constructor wiring the default component stack
pub struct PipelineBuilder {
    config: crate::config::CoreConfig,
}

impl PipelineBuilder {
    pub fn new(config: crate::config::CoreConfig) -> Self {
        Self { config }
    }

    /// Build a pipeline over the given boundary implementations
    pub fn build(
        self,
        store: Arc<dyn crate::retrieval::KnowledgeStore>,
        provider: Arc<dyn crate::embedding::EmbeddingProvider>,
        overrides: Arc<dyn crate::router::RoutingOverrides>,
    ) -> RetrievalPipeline {
        let router = QueryRouter::new(overrides, &self.config.router);
        let embeddings = EmbeddingClient::new(provider, &self.config.embedding);
        let retriever = HybridRetriever::new(store, self.config.fusion.clone());
        RetrievalPipeline::new(router, embeddings, retriever)
    }
}
