//! Qdrant vector store over its REST API.
//!
//! Collections are created with a single named dense vector
//! ([`DENSE_VECTOR`]) using cosine distance. Points carry the storage
//! record's payload verbatim.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use docuchunk_core::models::StorageRecord;
use docuchunk_core::store::{CollectionInfo, VectorStore};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::config::VectorStoreConfig;

/// Name of the dense vector slot in every collection.
pub const DENSE_VECTOR: &str = "dense";

pub struct QdrantStore {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl QdrantStore {
    /// Build a client from `[vector_store]`. The API key, if any, is read
    /// from the environment variable named by `api_key_env`.
    pub fn new(config: &VectorStoreConfig) -> Result<Self> {
        let api_key = match &config.api_key_env {
            Some(var) => Some(
                std::env::var(var)
                    .with_context(|| format!("Qdrant API key variable {} is not set", var))?,
            ),
            None => None,
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/collections/{}", self.url, collection)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        self.authorized(request)
            .send()
            .await
            .with_context(|| format!("Qdrant {} request failed", what))
    }
}

async fn ensure_success(response: Response, what: &str) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Qdrant {} failed ({}): {}", what, status, body);
    }
    Ok(response.json().await?)
}

fn create_collection_body(dims: usize) -> Value {
    json!({
        "vectors": {
            DENSE_VECTOR: { "size": dims, "distance": "Cosine" }
        }
    })
}

fn upsert_body(records: &[StorageRecord]) -> Value {
    let points: Vec<Value> = records
        .iter()
        .map(|r| {
            json!({
                "id": r.id,
                "vector": { DENSE_VECTOR: r.vector },
                "payload": r.payload(),
            })
        })
        .collect();
    json!({ "points": points })
}

fn parse_collection_info(name: &str, json: &Value) -> Result<CollectionInfo> {
    let result = json
        .get("result")
        .ok_or_else(|| anyhow!("Invalid Qdrant response: missing result"))?;
    let count = |key: &str| result.get(key).and_then(Value::as_u64).unwrap_or(0);
    Ok(CollectionInfo {
        name: name.to_string(),
        vectors_count: count("vectors_count"),
        indexed_vectors_count: count("indexed_vectors_count"),
        points_count: count("points_count"),
        status: result
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
    })
}

fn parse_collection_names(json: &Value) -> Result<Vec<String>> {
    let collections = json
        .pointer("/result/collections")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("Invalid Qdrant response: missing result.collections"))?;
    let mut names: Vec<String> = collections
        .iter()
        .filter_map(|c| c.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect();
    names.sort();
    Ok(names)
}

/// Dimension of the `dense` vector slot of an existing collection.
fn parse_dense_size(json: &Value) -> Option<u64> {
    let vectors = json.pointer("/result/config/params/vectors")?;
    vectors
        .get(DENSE_VECTOR)
        .and_then(|v| v.get("size"))
        .or_else(|| vectors.get("size"))
        .and_then(Value::as_u64)
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, collection: &str, dims: usize) -> Result<()> {
        let url = self.collection_url(collection);
        let response = self.send(self.client.get(&url), "get collection").await?;

        if response.status().is_success() {
            let json: Value = response.json().await?;
            if let Some(existing) = parse_dense_size(&json) {
                if existing != dims as u64 {
                    bail!(
                        "collection '{}' has vector size {}, expected {}",
                        collection,
                        existing,
                        dims
                    );
                }
            }
            return Ok(());
        }
        if response.status() != StatusCode::NOT_FOUND {
            ensure_success(response, "get collection").await?;
        }

        debug!(collection, dims, "creating Qdrant collection");
        let response = self
            .send(
                self.client.put(&url).json(&create_collection_body(dims)),
                "create collection",
            )
            .await?;
        ensure_success(response, "create collection").await?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: &[StorageRecord]) -> Result<()> {
        let url = format!("{}/points?wait=true", self.collection_url(collection));
        let response = self
            .send(self.client.put(&url).json(&upsert_body(records)), "upsert")
            .await?;
        ensure_success(response, "upsert").await?;
        debug!(collection, points = records.len(), "upserted points");
        Ok(())
    }

    async fn get_collection_info(&self, collection: &str) -> Result<Option<CollectionInfo>> {
        let response = self
            .send(self.client.get(self.collection_url(collection)), "get collection")
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let json = ensure_success(response, "get collection").await?;
        parse_collection_info(collection, &json).map(Some)
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let url = format!("{}/collections", self.url);
        let response = self.send(self.client.get(&url), "list collections").await?;
        let json = ensure_success(response, "list collections").await?;
        parse_collection_names(&json)
    }

    async fn delete_collection(&self, collection: &str) -> Result<()> {
        let response = self
            .send(
                self.client.delete(self.collection_url(collection)),
                "delete collection",
            )
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        ensure_success(response, "delete collection").await?;
        Ok(())
    }
}
