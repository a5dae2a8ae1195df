// Embedding layer: provider boundary, memoizing client, similarity math.

pub mod client;
pub mod provider;

pub use client::{cosine_similarity, EmbeddingClient};
pub use provider::{EmbeddingProvider, OllamaEmbeddingProvider, TaskType};
