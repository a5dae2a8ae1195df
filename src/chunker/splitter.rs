// Language-aware sliding-window splitter for knowledge ingestion.
//
// Tokenization is whitespace word-level, an approximation of true
// sub-word token counts (≈1:1.3 for Latin scripts, ≈1:4.3 for
// Perso-Arabic text). Callers size `chunk_size` with that ratio in
// mind; see budget::estimator for the shared token heuristic.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::chunker::language::{detect_language, Language, LanguageDetector};

/// Tokens scanned backward from a window edge looking for a sentence end
const SENTENCE_BACKSCAN: usize = 50;

/// Splitting options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkOptions {
    /// Target window size in words
    pub chunk_size: usize,
    /// Words shared between consecutive chunks
    pub overlap: usize,
    /// Keywords extracted per chunk
    pub top_keywords: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            overlap: 50,
            top_keywords: 8,
        }
    }
}

/// Source metadata carried onto every produced chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Identifier of the source document
    pub source_id: Option<String>,
    /// Page number within the source, when paginated
    pub page: Option<u32>,
}

/// One passage produced by splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextChunk {
    pub id: String,
    pub text: String,
    /// Position within the source, monotonically increasing from 0
    pub chunk_index: usize,
    /// Back-filled once splitting completes
    pub total_chunks: usize,
    pub word_count: usize,
    pub keywords: Vec<String>,
    pub language: Language,
    pub metadata: ChunkMetadata,
}

/// Splits long source text into overlapping, boundary-snapped passages
pub struct TextChunker {
    options: ChunkOptions,
    detector: LanguageDetector,
}

impl TextChunker {
    /// Create a chunker with default options and the ratio-based detector
    pub fn new() -> Self {
        Self {
            options: ChunkOptions::default(),
            detector: detect_language,
        }
    }

    /// Create with custom options
    pub fn with_options(options: ChunkOptions) -> Self {
        Self {
            options,
            detector: detect_language,
        }
    }

    /// Swap in a different detection strategy
    pub fn with_detector(mut self, detector: LanguageDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Split source text into ordered passages with metadata.
    ///
    /// Short text comes back as a single chunk. Longer text is windowed
    /// by `chunk_size` words advancing `chunk_size - overlap` per step,
    /// with each cut snapped backward (up to 50 words) onto a sentence
    /// boundary when one exists.
    pub fn split(&self, text: &str, metadata: &ChunkMetadata) -> Vec<TextChunk> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let language = (self.detector)(&normalized);
        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        if tokens.len() <= self.options.chunk_size {
            let chunk = self.make_chunk(&tokens, 0, language, metadata);
            return self.backfill_total(vec![chunk]);
        }

        let terminators = language.sentence_terminators();
        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut index = 0usize;

        loop {
            let raw_end = (start + self.options.chunk_size).min(tokens.len());
            let end = if raw_end < tokens.len() {
                // Never snap back into the overlap region: the next window
                // would start at or before this one and stall the walk.
                let floor = raw_end
                    .saturating_sub(SENTENCE_BACKSCAN)
                    .max(start + self.options.overlap + 1);
                snap_to_sentence(&tokens, floor, raw_end, terminators)
            } else {
                raw_end
            };

            chunks.push(self.make_chunk(&tokens[start..end], index, language, metadata));
            index += 1;

            if end >= tokens.len() {
                break;
            }

            let next = end.saturating_sub(self.options.overlap);
            // Guard against zero progress when overlap >= produced window
            start = if next > start { next } else { end };
        }

        self.backfill_total(chunks)
    }

    fn make_chunk(
        &self,
        tokens: &[&str],
        index: usize,
        language: Language,
        metadata: &ChunkMetadata,
    ) -> TextChunk {
        let text = tokens.join(" ");
        let keywords = extract_keywords(tokens, language, self.options.top_keywords);

        TextChunk {
            id: Uuid::new_v4().to_string(),
            text,
            chunk_index: index,
            total_chunks: 0,
            word_count: tokens.len(),
            keywords,
            language,
            metadata: metadata.clone(),
        }
    }

    fn backfill_total(&self, mut chunks: Vec<TextChunk>) -> Vec<TextChunk> {
        let total = chunks.len();
        for chunk in &mut chunks {
            chunk.total_chunks = total;
        }
        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse whitespace runs and duplicate zero-width non-joiners.
///
/// Persian sources frequently carry doubled U+200C from copy-paste;
/// collapsing keeps word tokenization stable.
pub fn normalize_text(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut prev_zwnj = false;
    for c in text.chars() {
        if c == '\u{200C}' {
            if prev_zwnj {
                continue;
            }
            prev_zwnj = true;
        } else {
            prev_zwnj = false;
        }
        collapsed.push(c);
    }

    collapsed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Scan backward from `raw_end` for a sentence-ending token and snap the
/// cut just after it. Falls back to the raw boundary when no terminator
/// sits within the scan window.
fn snap_to_sentence(
    tokens: &[&str],
    scan_floor: usize,
    raw_end: usize,
    terminators: &[char],
) -> usize {
    for i in (scan_floor..raw_end).rev() {
        let token = tokens[i - 1];
        if token.chars().last().map(|c| terminators.contains(&c)) == Some(true) {
            return i;
        }
    }
    raw_end
}

/// Stopword-filtered token frequency, top N, ties broken by first
/// occurrence in the text.
pub fn extract_keywords(tokens: &[&str], language: Language, top_n: usize) -> Vec<String> {
    let stopwords = language.stopwords();
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    for (position, token) in tokens.iter().enumerate() {
        let word: String = token
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '\u{200C}')
            .collect::<String>()
            .to_lowercase();

        if word.chars().count() < 2 || stopwords.contains(&word.as_str()) {
            continue;
        }

        let entry = counts.entry(word).or_insert((0, position));
        entry.0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(top_n);
    ranked.into_iter().map(|(word, _, _)| word).collect()
}
