//! Knowledge store boundary
//!
//! The store owns persistence and indexing; this core only reads.
//! Both fetch methods are pure reads and must tolerate `limit` up to
//! three times the caller's top_k.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::router::KnowledgeCategory;

/// One retrievable passage of tenant knowledge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub id: String,
    pub tenant_id: String,
    pub category: KnowledgeCategory,
    pub title: String,
    /// Non-empty passage text
    pub text: String,
    pub word_count: usize,
    /// Precomputed vector; dimension is constant across a tenant's index
    pub embedding: Option<Vec<f32>>,
    pub source_id: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Vector search hit: chunk plus cosine distance (0 = identical)
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub chunk: KnowledgeChunk,
    pub distance: f32,
}

/// Lexical search hit: chunk plus keyword-relevance score in [0, 1],
/// title matches weighted higher than body matches
#[derive(Debug, Clone)]
pub struct KeywordHit {
    pub chunk: KnowledgeChunk,
    pub score: f32,
}

/// Read-only contract over the tenant knowledge indexes
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Nearest chunks by cosine distance, ordered ascending by distance.
    /// An error means the vector index is unavailable for this category.
    async fn fetch_nearest_by_vector(
        &self,
        tenant: &str,
        category: KnowledgeCategory,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<VectorHit>>;

    /// Chunks ranked by keyword relevance, ordered descending by score
    async fn fetch_by_keyword(
        &self,
        tenant: &str,
        category: KnowledgeCategory,
        query: &str,
        limit: usize,
    ) -> Result<Vec<KeywordHit>>;
}
