//! ```text
//! Source Directory ──► loader::DirectoryLoader ──► SourceDocuments
//!                          (walkdir + bounded parallel extraction)
//!
//! SourceDocument ──► semantic_chunking::SemanticChunker ──► SemanticChunks
//!                          │
//!                          ├─► segmenter (sentences)
//!                          └─► embeddings (boundary detection)
//!
//! SemanticChunks ──► embeddings (storage vectors) ──► ChunkRecords
//!
//! ChunkRecords ──► stores::VectorStore ──► pgvector collection
//!                          (drop ─► create ─► transactional insert)
//! ```
//!
//! # chunksmith
//!
//! A one-shot batch pipeline that ingests PDF documents, splits them into
//! semantically coherent chunks, computes vector embeddings, and rebuilds a
//! pgvector collection with the results. Retrieval is out of scope: this
//! crate only writes the index.
//!
//! The destination collection is fully replaced on every run (pre-delete
//! semantics) — there are no merge or versioning semantics.
//!
//! ## Modules
//!
//! - [`config`] — explicit [`PipelineConfig`] threaded through the entry point
//! - [`loader`] — recursive discovery + bounded-parallel text extraction
//! - [`semantic_chunking`] — embedding-distance chunk boundaries
//! - [`stores`] — vector store backends (pgvector, in-memory)
//! - [`pipeline`] — the load → chunk → embed → write orchestration
//! - [`types`] — the [`IngestError`] taxonomy

pub mod config;
pub mod loader;
pub mod pipeline;
pub mod semantic_chunking;
pub mod stores;
pub mod types;

pub use config::PipelineConfig;
pub use pipeline::{IngestReport, run};
pub use types::IngestError;
