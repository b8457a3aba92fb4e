//! Postgres + pgvector backend.
//!
//! Each collection is its own table with an `embedding VECTOR(dims)` column
//! and JSONB metadata. Inserts run inside a single transaction so an
//! interrupted run leaves the collection empty rather than silently partial.

use std::collections::HashMap;

use async_trait::async_trait;
use pgvector::Vector;
use tokio_postgres::types::Json;
use tokio_postgres::{Client, NoTls};

use crate::types::IngestError;

use super::{ChunkRecord, VectorStore};

/// pgvector-backed [`VectorStore`].
pub struct PgVectorStore {
    client: tokio::sync::Mutex<Client>,
    /// Dimensionality recorded per collection created through this instance.
    created_dims: parking_lot::Mutex<HashMap<String, usize>>,
}

impl PgVectorStore {
    /// Connects to Postgres and ensures the `vector` extension exists.
    pub async fn connect(database_url: &str) -> Result<Self, IngestError> {
        let (client, connection) = tokio_postgres::connect(database_url, NoTls)
            .await
            .map_err(|err| IngestError::StoreConnection(err.to_string()))?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::error!(error = %err, "postgres connection task failed");
            }
        });

        client
            .execute("CREATE EXTENSION IF NOT EXISTS vector", &[])
            .await
            .map_err(|err| {
                IngestError::Storage(format!("failed to ensure pgvector extension: {err}"))
            })?;

        Ok(Self {
            client: tokio::sync::Mutex::new(client),
            created_dims: parking_lot::Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn delete_collection(&self, name: &str) -> Result<(), IngestError> {
        let table = quote_ident(name)?;
        let client = self.client.lock().await;
        client
            .execute(&format!("DROP TABLE IF EXISTS {table}"), &[])
            .await
            .map_err(|err| IngestError::Storage(format!("failed to drop collection: {err}")))?;
        self.created_dims.lock().remove(name);
        tracing::info!(collection = name, "dropped existing collection");
        Ok(())
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<(), IngestError> {
        if dimensions == 0 {
            return Err(IngestError::SchemaMismatch(
                "collection dimensionality must be positive".into(),
            ));
        }
        let table = quote_ident(name)?;
        let ddl = format!(
            "CREATE TABLE {table} (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                chunk_index BIGINT NOT NULL,
                content TEXT NOT NULL,
                metadata JSONB NOT NULL,
                embedding VECTOR({dimensions}) NOT NULL
            )"
        );
        let client = self.client.lock().await;
        client
            .execute(&ddl, &[])
            .await
            .map_err(|err| IngestError::Storage(format!("failed to create collection: {err}")))?;
        self.created_dims.lock().insert(name.to_string(), dimensions);
        tracing::info!(collection = name, dimensions, "created collection");
        Ok(())
    }

    async fn insert_chunks(
        &self,
        name: &str,
        records: Vec<ChunkRecord>,
    ) -> Result<usize, IngestError> {
        if records.is_empty() {
            return Ok(0);
        }
        let expected = self
            .created_dims
            .lock()
            .get(name)
            .copied()
            .unwrap_or(records[0].embedding.len());
        for record in &records {
            if record.embedding.len() != expected {
                return Err(IngestError::SchemaMismatch(format!(
                    "chunk {} carries a {}-dimensional vector, collection expects {}",
                    record.id,
                    record.embedding.len(),
                    expected
                )));
            }
        }

        let table = quote_ident(name)?;
        let sql = format!(
            "INSERT INTO {table} (id, source, chunk_index, content, metadata, embedding) \
             VALUES ($1, $2, $3, $4, $5, $6)"
        );

        let mut client = self.client.lock().await;
        let transaction = client
            .transaction()
            .await
            .map_err(|err| IngestError::Storage(err.to_string()))?;
        let statement = transaction
            .prepare(&sql)
            .await
            .map_err(|err| IngestError::Storage(err.to_string()))?;

        let mut inserted = 0usize;
        for record in &records {
            let chunk_index = i64::try_from(record.chunk_index).map_err(|_| {
                IngestError::Storage(format!(
                    "chunk_index {} exceeds i64 range",
                    record.chunk_index
                ))
            })?;
            let vector = Vector::from(record.embedding.clone());
            let metadata = Json(record.metadata.clone());
            transaction
                .execute(
                    &statement,
                    &[
                        &record.id,
                        &record.source,
                        &chunk_index,
                        &record.content,
                        &metadata,
                        &vector,
                    ],
                )
                .await
                .map_err(|err| map_insert_error(&record.id, err))?;
            inserted += 1;
        }
        transaction
            .commit()
            .await
            .map_err(|err| IngestError::Storage(err.to_string()))?;

        Ok(inserted)
    }

    async fn count(&self, name: &str) -> Result<usize, IngestError> {
        let table = quote_ident(name)?;
        let client = self.client.lock().await;
        let row = client
            .query_one(&format!("SELECT COUNT(*) FROM {table}"), &[])
            .await
            .map_err(|err| IngestError::Storage(err.to_string()))?;
        let count: i64 = row.get(0);
        Ok(count as usize)
    }
}

/// Dimension complaints from pgvector surface as schema mismatches.
fn map_insert_error(chunk_id: &str, err: tokio_postgres::Error) -> IngestError {
    let message = err.to_string();
    if message.contains("dimensions") {
        IngestError::SchemaMismatch(format!("chunk {chunk_id}: {message}"))
    } else {
        IngestError::Storage(format!("failed to insert chunk {chunk_id}: {message}"))
    }
}

/// Quotes a collection name as a Postgres identifier.
fn quote_ident(name: &str) -> Result<String, IngestError> {
    if name.trim().is_empty() {
        return Err(IngestError::Storage("empty collection name".into()));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}
