// Hybrid retrieval: store boundary, rank fusion, budget trimming.

pub mod hybrid;
pub mod store;

pub use hybrid::{
    HybridRetriever, RankedPassages, RetrievalMethod, ScoredPassage, TRUNCATION_MARKER,
};
pub use store::{KeywordHit, KnowledgeChunk, KnowledgeStore, VectorHit};
