//! Chunking output types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A contiguous span of a source document, bounded by semantic shifts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticChunk {
    /// Unique identifier, assigned at creation.
    pub id: Uuid,
    /// Zero-based position of this chunk within its document.
    pub index: usize,
    /// The merged sentence text.
    pub text: String,
}

impl SemanticChunk {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            index,
            text: text.into(),
        }
    }
}

/// Summary statistics for one document's chunking pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkingStats {
    pub total_sentences: usize,
    pub total_chunks: usize,
    /// Number of breakpoints inserted between sentences.
    pub breakpoints: usize,
}

/// The chunks produced from one document, in source order.
#[derive(Debug, Clone, Default)]
pub struct ChunkingOutcome {
    pub chunks: Vec<SemanticChunk>,
    pub stats: ChunkingStats,
}
