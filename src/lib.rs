//! lexivec - Tenant-scoped hybrid retrieval core
//!
//! Given a user's natural-language query and a tenant knowledge base,
//! this crate decides which knowledge categories to consult, what
//! passages are relevant, and how much of them fit a bounded context
//! window, then hands the assembled, ranked, budget-capped context to
//! the caller's prompt builder.
//!
//! # Architecture
//!
//! - **Router**: keyword-table intent classification and category/budget
//!   resolution, tenant-overridable with cached tables
//! - **Embedding**: cache-first provider client plus similarity math
//! - **Retrieval**: concurrent vector + lexical search fused with RRF,
//!   trimmed to a token budget, with a keyword-only degradation chain
//! - **Chunker**: language-aware splitting and extractive summaries for
//!   ingestion-side callers
//! - **Budget**: shared token estimator and prompt-window allocator

pub mod budget;
pub mod cache;
pub mod chunker;
pub mod config;
pub mod embedding;
pub mod errors;
pub mod pipeline;
pub mod retrieval;
pub mod router;

// Re-export commonly used types
pub use errors::{RetrievalError, Result};

pub use budget::{BudgetAllocator, PromptComponents, TokenEstimator};
pub use chunker::{detect_language, summarize, Language, TextChunker};
pub use config::{CoreConfig, EmbeddingConfig, FusionConfig, RouterConfig};
pub use embedding::{cosine_similarity, EmbeddingClient, EmbeddingProvider, TaskType};
pub use pipeline::{PipelineBuilder, PipelineOutput, RetrievalPipeline, RetrievalResult};
pub use retrieval::{
    HybridRetriever, KnowledgeChunk, KnowledgeStore, RankedPassages, RetrievalMethod,
    ScoredPassage,
};
pub use router::{Intent, KnowledgeCategory, QueryRouter, QueryRouting, RoutingOverrides};
