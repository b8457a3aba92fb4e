//! Vector store backends.
//!
//! [`VectorStore`] abstracts the destination of the pipeline: a named
//! collection of (text, vector, metadata) records that is fully replaced on
//! every run. Collections carry a fixed dimensionality set at creation;
//! inserting a vector of any other length is a schema mismatch, never a
//! silent coercion.
//!
//! Two simultaneous runs targeting the same collection name race on
//! delete/create; the writer is not safe to run concurrently with itself.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::IngestError;

pub use memory::MemoryStore;
pub use postgres::PgVectorStore;

/// One chunk ready for persistence: text, vector, and provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique identifier for this chunk.
    pub id: String,
    /// Source file path the chunk came from.
    pub source: String,
    /// Zero-based index of the chunk within its source document.
    pub chunk_index: usize,
    /// The chunk text.
    pub content: String,
    /// Additional metadata as JSON.
    pub metadata: serde_json::Value,
    /// The embedding vector.
    pub embedding: Vec<f32>,
}

/// Destination for chunk records, keyed by collection name.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Drops the named collection if it exists. Destructive and
    /// non-reversible; succeeding on an absent collection is not an error.
    async fn delete_collection(&self, name: &str) -> Result<(), IngestError>;

    /// Creates a fresh, empty collection with the given vector
    /// dimensionality. Fails if the collection already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<(), IngestError>;

    /// Inserts records into the named collection and returns how many were
    /// written. A count short of `records.len()` must surface as an error at
    /// the call site, never as a silent drop.
    async fn insert_chunks(
        &self,
        name: &str,
        records: Vec<ChunkRecord>,
    ) -> Result<usize, IngestError>;

    /// Number of records currently in the named collection.
    async fn count(&self, name: &str) -> Result<usize, IngestError>;
}
