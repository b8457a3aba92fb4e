//! The semantic chunker: segment → window → embed → breakpoints → merge.

use std::sync::Arc;

use crate::types::IngestError;

use super::breakpoints::{breakpoint_indices, consecutive_distances};
use super::config::ChunkingConfig;
use super::embeddings::EmbeddingProvider;
use super::segmenter::split_sentences;
use super::types::{ChunkingOutcome, ChunkingStats, SemanticChunk};

/// Splits documents along semantic shifts instead of fixed-size windows.
///
/// Sentences are embedded (each joined with its `buffer_size` neighbors to
/// smooth noise), consecutive window embeddings are compared by cosine
/// distance, and a boundary is inserted wherever the distance clears the
/// configured threshold. Sentences between boundaries merge into one chunk.
///
/// An embedding failure fails the whole document: falling back to fixed-size
/// splitting would silently break the semantic-boundary contract.
pub struct SemanticChunker {
    provider: Arc<dyn EmbeddingProvider>,
    config: ChunkingConfig,
}

impl SemanticChunker {
    /// Creates a chunker with default configuration.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_config(provider, ChunkingConfig::default())
    }

    /// Creates a chunker with explicit configuration.
    pub fn with_config(provider: Arc<dyn EmbeddingProvider>, config: ChunkingConfig) -> Self {
        Self { provider, config }
    }

    /// Chunks one document's text.
    ///
    /// Empty input yields zero chunks; a single-sentence document yields
    /// exactly one chunk containing the whole text.
    pub async fn chunk_document(&self, text: &str) -> Result<ChunkingOutcome, IngestError> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Ok(ChunkingOutcome::default());
        }
        if sentences.len() == 1 {
            return Ok(ChunkingOutcome {
                chunks: vec![SemanticChunk::new(0, text.trim())],
                stats: ChunkingStats {
                    total_sentences: 1,
                    total_chunks: 1,
                    breakpoints: 0,
                },
            });
        }

        let windows = buffered_windows(&sentences, self.config.buffer_size);
        let embeddings = self.provider.embed_batch(&windows).await?;
        if embeddings.len() != windows.len() {
            return Err(IngestError::Embedding(format!(
                "provider '{}' returned {} vectors for {} windows",
                self.provider.id(),
                embeddings.len(),
                windows.len()
            )));
        }

        let distances = consecutive_distances(&embeddings);
        let breaks = breakpoint_indices(&distances, self.config.strategy);

        let chunks = assemble_chunks(&sentences, &breaks);
        let stats = ChunkingStats {
            total_sentences: sentences.len(),
            total_chunks: chunks.len(),
            breakpoints: breaks.len(),
        };
        tracing::debug!(
            provider = self.provider.id(),
            sentences = stats.total_sentences,
            chunks = stats.total_chunks,
            breakpoints = stats.breakpoints,
            "chunked document"
        );

        Ok(ChunkingOutcome { chunks, stats })
    }
}

/// Joins each sentence with up to `buffer_size` neighbors on both sides.
fn buffered_windows(sentences: &[String], buffer_size: usize) -> Vec<String> {
    (0..sentences.len())
        .map(|i| {
            let start = i.saturating_sub(buffer_size);
            let end = (i + buffer_size + 1).min(sentences.len());
            sentences[start..end].join(" ")
        })
        .collect()
}

/// Merges sentences between breakpoints, preserving source order.
/// `breaks` holds indices `i` where a boundary sits after sentence `i`.
fn assemble_chunks(sentences: &[String], breaks: &[usize]) -> Vec<SemanticChunk> {
    let mut chunks = Vec::with_capacity(breaks.len() + 1);
    let mut current: Vec<&str> = Vec::new();
    let mut next_break = breaks.iter().copied().peekable();

    for (i, sentence) in sentences.iter().enumerate() {
        current.push(sentence);
        if next_break.peek() == Some(&i) {
            next_break.next();
            chunks.push(SemanticChunk::new(chunks.len(), current.join(" ")));
            current.clear();
        }
    }
    if !current.is_empty() {
        chunks.push(SemanticChunk::new(chunks.len(), current.join(" ")));
    }
    chunks
}
