//! The four-stage batch pipeline: load → chunk → embed → write.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::PipelineConfig;
use crate::loader::DirectoryLoader;
use crate::semantic_chunking::{EmbeddingProvider, SemanticChunker};
use crate::stores::{ChunkRecord, VectorStore};
use crate::types::IngestError;

/// Counters from one pipeline invocation.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub documents_loaded: usize,
    pub documents_failed: usize,
    pub chunks_written: usize,
    pub duration: Duration,
}

/// Runs the whole pipeline once.
///
/// The provider serves both embedding passes (chunk-boundary detection and
/// the final storage vectors), so the two uses cannot drift apart. Stage
/// failures abort the run; the loader's per-file skip-and-continue is the
/// only tolerated partial failure.
///
/// Destructive: the destination collection is dropped before the rebuild. A
/// failure between the drop and the transactional insert leaves the
/// collection empty (never silently partial) and requires a full re-run.
pub async fn run(
    config: &PipelineConfig,
    provider: Arc<dyn EmbeddingProvider>,
    store: &dyn VectorStore,
) -> Result<IngestReport, IngestError> {
    let started = Instant::now();

    let loader = DirectoryLoader::new(&config.source_dir)
        .with_glob(&config.glob)
        .with_max_concurrency(config.max_concurrency)
        .with_progress(config.show_progress);
    let loaded = loader.load().await?;

    let chunker = SemanticChunker::with_config(Arc::clone(&provider), config.chunking.clone());
    let mut pending = Vec::new();
    for document in &loaded.documents {
        let outcome = chunker.chunk_document(&document.text).await?;
        tracing::info!(
            source = %document.path.display(),
            chunks = outcome.chunks.len(),
            "chunked document"
        );
        for chunk in outcome.chunks {
            pending.push((document, chunk));
        }
    }

    let texts: Vec<String> = pending
        .iter()
        .map(|(_, chunk)| chunk.text.clone())
        .collect();
    let vectors = provider.embed_batch(&texts).await?;
    if vectors.len() != texts.len() {
        return Err(IngestError::Embedding(format!(
            "provider '{}' returned {} vectors for {} chunks",
            provider.id(),
            vectors.len(),
            texts.len()
        )));
    }

    let dimensions = provider
        .dimensions()
        .or_else(|| vectors.first().map(Vec::len))
        .ok_or_else(|| {
            IngestError::SchemaMismatch(
                "cannot determine collection dimensionality: no chunks and the provider \
                 declares no fixed output dimension"
                    .into(),
            )
        })?;
    for vector in &vectors {
        if vector.len() != dimensions {
            return Err(IngestError::SchemaMismatch(format!(
                "provider '{}' returned a {}-dimensional vector, expected {}",
                provider.id(),
                vector.len(),
                dimensions
            )));
        }
    }

    let records: Vec<ChunkRecord> = pending
        .into_iter()
        .zip(vectors)
        .map(|((document, chunk), embedding)| ChunkRecord {
            id: chunk.id.to_string(),
            source: document.path.display().to_string(),
            chunk_index: chunk.index,
            content: chunk.text,
            metadata: document.metadata.clone(),
            embedding,
        })
        .collect();
    let total = records.len();

    store.delete_collection(&config.collection).await?;
    store.create_collection(&config.collection, dimensions).await?;
    let inserted = store.insert_chunks(&config.collection, records).await?;
    if inserted != total {
        return Err(IngestError::Storage(format!(
            "store reported {inserted} of {total} records written"
        )));
    }

    let report = IngestReport {
        documents_loaded: loaded.documents.len(),
        documents_failed: loaded.failures.len(),
        chunks_written: inserted,
        duration: started.elapsed(),
    };
    tracing::info!(
        collection = %config.collection,
        documents = report.documents_loaded,
        skipped = report.documents_failed,
        chunks = report.chunks_written,
        elapsed_ms = report.duration.as_millis() as u64,
        "ingestion complete"
    );
    Ok(report)
}
