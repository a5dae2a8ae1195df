// Hybrid retrieval: concurrent vector + lexical search per category,
// reciprocal-rank fusion, weighted scoring, token-budget trimming.
//
// Degradation chain: hybrid -> keyword_only (vector index unavailable)
// -> one vector-only retry (lexical exception mid-pipeline) -> empty.
// Retrieval never propagates an error to the caller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::budget::TokenEstimator;
use crate::config::FusionConfig;
use crate::errors::{RetrievalError, Result};
use crate::retrieval::store::{KeywordHit, KnowledgeChunk, KnowledgeStore, VectorHit};
use crate::router::KnowledgeCategory;

/// Marker appended to a passage truncated mid-text to fit the budget
pub const TRUNCATION_MARKER: &str = "…";

/// Which search path produced a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMethod {
    Hybrid,
    KeywordOnly,
    VectorOnly,
}

impl RetrievalMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hybrid => "hybrid",
            Self::KeywordOnly => "keyword_only",
            Self::VectorOnly => "vector_only",
        }
    }
}

/// A ranked, budget-trimmed passage handed to the prompt builder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub chunk_id: String,
    pub title: String,
    pub text: String,
    pub category: KnowledgeCategory,
    pub source_id: Option<String>,
    pub vector_score: Option<f32>,
    pub vector_rank: Option<usize>,
    pub keyword_score: Option<f32>,
    pub keyword_rank: Option<usize>,
    pub rrf_score: f32,
    /// Fused score; strictly orders the returned list
    pub hybrid_score: f32,
    pub estimated_tokens: usize,
    pub truncated: bool,
}

/// Ordered passages plus the method that produced them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPassages {
    pub passages: Vec<ScoredPassage>,
    pub method: RetrievalMethod,
}

impl RankedPassages {
    fn empty(method: RetrievalMethod) -> Self {
        Self {
            passages: Vec::new(),
            method,
        }
    }
}

/// A chunk mid-fusion; at least one axis is always populated
struct Candidate {
    chunk: KnowledgeChunk,
    vector_score: Option<f32>,
    vector_rank: Option<usize>,
    keyword_score: Option<f32>,
    keyword_rank: Option<usize>,
}

impl Candidate {
    fn new(chunk: KnowledgeChunk) -> Self {
        Self {
            chunk,
            vector_score: None,
            vector_rank: None,
            keyword_score: None,
            keyword_rank: None,
        }
    }
}

#[derive(Clone, Copy)]
enum Mode {
    Hybrid,
    VectorOnly,
}

/// Orchestrates both search axes for one category and fuses the results
pub struct HybridRetriever {
    store: Arc<dyn KnowledgeStore>,
    config: FusionConfig,
    estimator: TokenEstimator,
    search_timeout: Duration,
}

impl HybridRetriever {
    /// Create a retriever over the given knowledge store
    pub fn new(store: Arc<dyn KnowledgeStore>, config: FusionConfig) -> Self {
        let search_timeout = Duration::from_secs(config.search_timeout_secs);
        Self {
            store,
            config,
            estimator: TokenEstimator::new(),
            search_timeout,
        }
    }

    /// Retrieve the best passages for a query within one category.
    ///
    /// Returns an ordered, budget-trimmed list and the method that
    /// produced it. Never returns an error: a failed pipeline retries
    /// once in vector-only mode and then surfaces an empty list.
    pub async fn retrieve(
        &self,
        query: &str,
        tenant: &str,
        category: KnowledgeCategory,
        query_vector: Option<&[f32]>,
        top_k: usize,
        token_budget: usize,
    ) -> RankedPassages {
        match self
            .run(query, tenant, category, query_vector, top_k, token_budget, Mode::Hybrid)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    tenant,
                    category = category.as_str(),
                    error = %e,
                    "hybrid retrieval failed, retrying vector-only"
                );
                match self
                    .run(
                        query,
                        tenant,
                        category,
                        query_vector,
                        top_k,
                        token_budget,
                        Mode::VectorOnly,
                    )
                    .await
                {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(
                            tenant,
                            category = category.as_str(),
                            error = %e,
                            "vector-only retry failed, returning empty result"
                        );
                        RankedPassages::empty(RetrievalMethod::VectorOnly)
                    }
                }
            }
        }
    }

    async fn run(
        &self,
        query: &str,
        tenant: &str,
        category: KnowledgeCategory,
        query_vector: Option<&[f32]>,
        top_k: usize,
        token_budget: usize,
        mode: Mode,
    ) -> Result<RankedPassages> {
        let limit = top_k * self.config.candidate_multiplier;

        let (vector_hits, keyword_hits, method) = match mode {
            Mode::Hybrid => {
                // Both axes are independent reads; run them concurrently.
                // A missing or failing vector index degrades to lexical
                // only; a lexical failure aborts this attempt instead.
                let vector_fut = async {
                    match query_vector {
                        Some(vector) => {
                            match self.vector_search(tenant, category, vector, limit).await {
                                Ok(hits) => (hits, true),
                                Err(e) => {
                                    warn!(
                                        tenant,
                                        category = category.as_str(),
                                        error = %e,
                                        "vector index unavailable, keyword-only"
                                    );
                                    (Vec::new(), false)
                                }
                            }
                        }
                        None => (Vec::new(), false),
                    }
                };
                let keyword_fut = self.keyword_search(tenant, category, query, limit);

                let ((vector_hits, vector_available), keyword_result) =
                    tokio::join!(vector_fut, keyword_fut);
                let keyword_hits = keyword_result?;

                let method = if vector_available {
                    RetrievalMethod::Hybrid
                } else {
                    RetrievalMethod::KeywordOnly
                };
                (vector_hits, keyword_hits, method)
            }
            Mode::VectorOnly => {
                let vector = query_vector.ok_or_else(|| {
                    RetrievalError::StoreError("no query vector for vector-only retry".to_string())
                })?;
                let hits = self.vector_search(tenant, category, vector, limit).await?;
                (hits, Vec::new(), RetrievalMethod::VectorOnly)
            }
        };

        let fused = self.fuse(vector_hits, keyword_hits, top_k);
        debug!(
            tenant,
            category = category.as_str(),
            method = method.as_str(),
            candidates = fused.len(),
            "fusion complete"
        );

        let passages = self.trim_to_budget(fused, token_budget);
        Ok(RankedPassages { passages, method })
    }

    /// Vector fetch under a bounded timeout; a timeout is treated
    /// identically to a backend failure
    async fn vector_search(
        &self,
        tenant: &str,
        category: KnowledgeCategory,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<VectorHit>> {
        timeout(
            self.search_timeout,
            self.store.fetch_nearest_by_vector(tenant, category, vector, limit),
        )
        .await
        .map_err(|_| RetrievalError::Timeout {
            duration_ms: self.search_timeout.as_millis() as u64,
        })?
    }

    /// Lexical fetch under the same bounded timeout policy
    async fn keyword_search(
        &self,
        tenant: &str,
        category: KnowledgeCategory,
        query: &str,
        limit: usize,
    ) -> Result<Vec<KeywordHit>> {
        timeout(
            self.search_timeout,
            self.store.fetch_by_keyword(tenant, category, query, limit),
        )
        .await
        .map_err(|_| RetrievalError::Timeout {
            duration_ms: self.search_timeout.as_millis() as u64,
        })?
    }

    /// Merge both result sets, apply floors, assign 1-based ranks, and
    /// score with RRF plus the weighted axis scores.
    fn fuse(
        &self,
        vector_hits: Vec<VectorHit>,
        keyword_hits: Vec<KeywordHit>,
        top_k: usize,
    ) -> Vec<(Candidate, f32, f32)> {
        let mut by_id: HashMap<String, Candidate> = HashMap::new();

        let mut rank = 0usize;
        for hit in vector_hits {
            let similarity = 1.0 - hit.distance;
            if similarity < self.config.min_vector_similarity {
                continue;
            }
            rank += 1;
            let candidate = by_id
                .entry(hit.chunk.id.clone())
                .or_insert_with(|| Candidate::new(hit.chunk));
            candidate.vector_score = Some(similarity);
            candidate.vector_rank = Some(rank);
        }

        let mut rank = 0usize;
        for hit in keyword_hits {
            if hit.score < self.config.min_keyword_score {
                continue;
            }
            rank += 1;
            let candidate = by_id
                .entry(hit.chunk.id.clone())
                .or_insert_with(|| Candidate::new(hit.chunk));
            candidate.keyword_score = Some(hit.score);
            candidate.keyword_rank = Some(rank);
        }

        let mut scored: Vec<(Candidate, f32, f32)> = by_id
            .into_values()
            .map(|candidate| {
                let rrf = self.rrf_score(candidate.vector_rank)
                    + self.rrf_score(candidate.keyword_rank);
                let hybrid = self.config.vector_weight * candidate.vector_score.unwrap_or(0.0)
                    + self.config.keyword_weight * candidate.keyword_score.unwrap_or(0.0)
                    + self.config.rrf_weight * rrf;
                (candidate, rrf, hybrid)
            })
            .collect();

        // Chunk id as the final tie-break keeps repeat calls identical
        scored.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.chunk.id.cmp(&b.0.chunk.id))
        });
        scored.truncate(top_k);
        scored
    }

    fn rrf_score(&self, rank: Option<usize>) -> f32 {
        match rank {
            Some(r) => 1.0 / (self.config.rrf_k + r as f32),
            None => 0.0,
        }
    }

    /// Walk the ranked list accumulating estimated token costs. Whole
    /// passages are included while they fit; the first overflowing
    /// passage is word-truncated when at least `min_tail_tokens` of
    /// budget remain, and the walk stops either way.
    fn trim_to_budget(
        &self,
        ranked: Vec<(Candidate, f32, f32)>,
        token_budget: usize,
    ) -> Vec<ScoredPassage> {
        let mut passages = Vec::new();
        let mut spent = 0usize;

        for (candidate, rrf, hybrid) in ranked {
            let cost = self.estimator.estimate_words(candidate.chunk.word_count);

            if spent + cost <= token_budget {
                spent += cost;
                passages.push(self.to_passage(candidate, rrf, hybrid, cost, false));
                continue;
            }

            let remaining = token_budget - spent;
            if remaining >= self.config.min_tail_tokens {
                let fit = self.estimator.words_fitting(remaining);
                let words: Vec<&str> = candidate.chunk.text.split_whitespace().collect();
                if fit > 0 && fit < words.len() {
                    let truncated_text = format!("{}{}", words[..fit].join(" "), TRUNCATION_MARKER);
                    let cost = self.estimator.estimate_words(fit);
                    let mut candidate = candidate;
                    candidate.chunk.text = truncated_text;
                    candidate.chunk.word_count = fit;
                    passages.push(self.to_passage(candidate, rrf, hybrid, cost, true));
                }
            }
            break;
        }

        passages
    }

    fn to_passage(
        &self,
        candidate: Candidate,
        rrf: f32,
        hybrid: f32,
        estimated_tokens: usize,
        truncated: bool,
    ) -> ScoredPassage {
        ScoredPassage {
            chunk_id: candidate.chunk.id,
            title: candidate.chunk.title,
            text: candidate.chunk.text,
            category: candidate.chunk.category,
            source_id: candidate.chunk.source_id,
            vector_score: candidate.vector_score,
            vector_rank: candidate.vector_rank,
            keyword_score: candidate.keyword_score,
            keyword_rank: candidate.keyword_rank,
            rrf_score: rrf,
            hybrid_score: hybrid,
            estimated_tokens,
            truncated,
        }
    }
}
