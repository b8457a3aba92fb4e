//! Semantic chunking: embedding-distance boundaries instead of fixed-size
//! windows.
//!
//! * [`segmenter`] — sentence segmentation.
//! * [`embeddings`] — the [`EmbeddingProvider`](embeddings::EmbeddingProvider)
//!   seam plus OpenAI-compatible and mock implementations.
//! * [`breakpoints`] — distance and threshold math.
//! * [`service`] — [`SemanticChunker`](service::SemanticChunker), the piece
//!   that ties them together.

pub mod config;
pub mod embeddings;
pub mod segmenter;
pub mod service;
pub mod types;

mod breakpoints;

pub use config::{BreakpointStrategy, ChunkingConfig};
pub use embeddings::{EmbeddingProvider, MockEmbeddingProvider, OpenAiEmbeddingProvider};
pub use service::SemanticChunker;
pub use types::{ChunkingOutcome, ChunkingStats, SemanticChunk};
