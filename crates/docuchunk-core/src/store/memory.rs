//! In-memory [`VectorStore`] implementation for tests and embedding hosts
//! without a running index.
//!
//! Collections live in a `HashMap` behind `std::sync::RwLock`. Upserts
//! replace records with the same id and enforce the collection's dimension.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::models::StorageRecord;

use super::{CollectionInfo, VectorStore};

struct StoredCollection {
    dims: usize,
    records: Vec<StorageRecord>,
}

/// In-memory store that also counts upsert calls.
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, StoredCollection>>,
    upsert_calls: AtomicUsize,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            upsert_calls: AtomicUsize::new(0),
        }
    }

    /// Number of `upsert` calls received, successful or not.
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of the records in `collection`, in insertion order.
    pub fn records(&self, collection: &str) -> Vec<StorageRecord> {
        self.collections
            .read()
            .ok()
            .and_then(|c| c.get(collection).map(|sc| sc.records.clone()))
            .unwrap_or_default()
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(&self, collection: &str, dims: usize) -> Result<()> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        match collections.get(collection) {
            Some(existing) if existing.dims != dims => bail!(
                "collection '{}' has dimension {}, requested {}",
                collection,
                existing.dims,
                dims
            ),
            Some(_) => {}
            None => {
                collections.insert(
                    collection.to_string(),
                    StoredCollection {
                        dims,
                        records: Vec::new(),
                    },
                );
            }
        }
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: &[StorageRecord]) -> Result<()> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        let mut collections = self.collections.write().map_err(poisoned)?;
        let stored = collections
            .get_mut(collection)
            .ok_or_else(|| anyhow!("collection '{}' not found", collection))?;

        if let Some(bad) = records.iter().find(|r| r.vector.len() != stored.dims) {
            bail!(
                "record {} has dimension {}, collection '{}' expects {}",
                bad.id,
                bad.vector.len(),
                collection,
                stored.dims
            );
        }

        for record in records {
            stored.records.retain(|r| r.id != record.id);
            stored.records.push(record.clone());
        }
        Ok(())
    }

    async fn get_collection_info(&self, collection: &str) -> Result<Option<CollectionInfo>> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections.get(collection).map(|sc| {
            let count = sc.records.len() as u64;
            CollectionInfo {
                name: collection.to_string(),
                vectors_count: count,
                indexed_vectors_count: count,
                points_count: count,
                status: "green".to_string(),
            }
        }))
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let collections = self.collections.read().map_err(poisoned)?;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete_collection(&self, collection: &str) -> Result<()> {
        self.collections
            .write()
            .map_err(poisoned)?
            .remove(collection);
        Ok(())
    }
}
