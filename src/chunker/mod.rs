// Language-aware chunking: script detection, sliding-window splitting,
// per-chunk keyword extraction, extractive summaries.

pub mod language;
pub mod splitter;
pub mod summary;

pub use language::{detect_language, Language, LanguageDetector};
pub use splitter::{ChunkMetadata, ChunkOptions, TextChunk, TextChunker};
pub use summary::summarize;
