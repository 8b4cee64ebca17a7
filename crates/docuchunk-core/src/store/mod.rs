//! Vector-store abstraction.
//!
//! The [`VectorStore`] trait is the narrow surface the pipeline writes
//! through. Implementations are `Send + Sync` and async (via `async-trait`);
//! the application ships a Qdrant client, and [`memory::InMemoryVectorStore`]
//! backs tests.
//!
//! Retry and backoff are the implementation's business; the pipeline calls
//! each operation once and reports any error as-is.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::StorageRecord;

/// Summary of one collection, as reported by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub vectors_count: u64,
    pub indexed_vectors_count: u64,
    pub points_count: u64,
    pub status: String,
}

/// Abstract vector index.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`ensure_collection`](VectorStore::ensure_collection) | Create a collection of the given dimension if missing |
/// | [`upsert`](VectorStore::upsert) | Insert or replace records, all in one request |
/// | [`get_collection_info`](VectorStore::get_collection_info) | Counts and status, `None` if missing |
/// | [`list_collections`](VectorStore::list_collections) | Names of all collections |
/// | [`delete_collection`](VectorStore::delete_collection) | Drop a collection and its points |
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn ensure_collection(&self, collection: &str, dims: usize) -> Result<()>;

    async fn upsert(&self, collection: &str, records: &[StorageRecord]) -> Result<()>;

    async fn get_collection_info(&self, collection: &str) -> Result<Option<CollectionInfo>>;

    async fn list_collections(&self) -> Result<Vec<String>>;

    async fn delete_collection(&self, collection: &str) -> Result<()>;
}
