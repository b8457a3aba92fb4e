//! In-process store for tests and dry runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::IngestError;

use super::{ChunkRecord, VectorStore};

#[derive(Debug)]
struct Collection {
    dimensions: usize,
    records: Vec<ChunkRecord>,
}

/// [`VectorStore`] backed by a process-local map. Enforces the same
/// create/insert/dimension contract as the Postgres backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<String, Collection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a collection's records, for assertions.
    pub fn records(&self, name: &str) -> Option<Vec<ChunkRecord>> {
        self.collections
            .lock()
            .get(name)
            .map(|collection| collection.records.clone())
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn delete_collection(&self, name: &str) -> Result<(), IngestError> {
        self.collections.lock().remove(name);
        Ok(())
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<(), IngestError> {
        if dimensions == 0 {
            return Err(IngestError::SchemaMismatch(
                "collection dimensionality must be positive".into(),
            ));
        }
        let mut collections = self.collections.lock();
        if collections.contains_key(name) {
            return Err(IngestError::Storage(format!(
                "collection '{name}' already exists"
            )));
        }
        collections.insert(
            name.to_string(),
            Collection {
                dimensions,
                records: Vec::new(),
            },
        );
        Ok(())
    }

    async fn insert_chunks(
        &self,
        name: &str,
        records: Vec<ChunkRecord>,
    ) -> Result<usize, IngestError> {
        let mut collections = self.collections.lock();
        let collection = collections.get_mut(name).ok_or_else(|| {
            IngestError::Storage(format!("collection '{name}' does not exist"))
        })?;
        for record in &records {
            if record.embedding.len() != collection.dimensions {
                return Err(IngestError::SchemaMismatch(format!(
                    "chunk {} carries a {}-dimensional vector, collection expects {}",
                    record.id,
                    record.embedding.len(),
                    collection.dimensions
                )));
            }
        }
        let inserted = records.len();
        collection.records.extend(records);
        Ok(inserted)
    }

    async fn count(&self, name: &str) -> Result<usize, IngestError> {
        Ok(self
            .collections
            .lock()
            .get(name)
            .map_or(0, |collection| collection.records.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, dims: usize) -> ChunkRecord {
        ChunkRecord {
            id: id.to_string(),
            source: "test.pdf".to_string(),
            chunk_index: 0,
            content: "text".to_string(),
            metadata: serde_json::json!({}),
            embedding: vec![0.5; dims],
        }
    }

    #[tokio::test]
    async fn create_insert_count_roundtrip() {
        let store = MemoryStore::new();
        store.create_collection("c", 4).await.unwrap();
        let inserted = store
            .insert_chunks("c", vec![record("a", 4), record("b", 4)])
            .await
            .unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(store.count("c").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn wrong_dimensionality_is_a_schema_mismatch() {
        let store = MemoryStore::new();
        store.create_collection("c", 4).await.unwrap();
        let err = store
            .insert_chunks("c", vec![record("a", 3)])
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::SchemaMismatch(_)));
        assert_eq!(store.count("c").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_create_rejects_duplicates() {
        let store = MemoryStore::new();
        store.delete_collection("absent").await.unwrap();
        store.create_collection("c", 2).await.unwrap();
        assert!(store.create_collection("c", 2).await.is_err());
        store.delete_collection("c").await.unwrap();
        store.create_collection("c", 2).await.unwrap();
    }

    #[tokio::test]
    async fn insert_into_missing_collection_fails() {
        let store = MemoryStore::new();
        let err = store
            .insert_chunks("ghost", vec![record("a", 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Storage(_)));
    }
}
