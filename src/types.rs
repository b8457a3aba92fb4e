//! Crate-wide error taxonomy.
//!
//! Every fallible operation in the pipeline surfaces as an [`IngestError`].
//! The variants map onto the pipeline's external boundaries: filesystem
//! discovery, per-file extraction, the remote embedding service, and the
//! vector store. Filesystem failures always surface through the per-file
//! [`IngestError::Extraction`] variant, never as a bare io error.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The configured source directory does not exist or is not a directory.
    #[error("source directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// A single file's text extraction failed. Isolated per file: one
    /// unreadable document never corrupts another's output.
    #[error("failed to extract text from {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },

    /// The remote embedding service rejected or failed a request
    /// (network, auth, rate limit, or malformed response).
    #[error("embedding request failed: {0}")]
    Embedding(String),

    /// Could not establish a connection to the vector store.
    #[error("vector store connection failed: {0}")]
    StoreConnection(String),

    /// Vector dimensionality disagrees with the collection schema.
    /// Never coerced silently.
    #[error("embedding dimensionality mismatch: {0}")]
    SchemaMismatch(String),

    /// A vector store operation failed after connecting.
    #[error("vector store operation failed: {0}")]
    Storage(String),

    /// Missing or malformed configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
