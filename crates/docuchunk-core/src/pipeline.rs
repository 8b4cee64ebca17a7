//! The chunk pipeline: validate → chunk → embed → build records → upsert.
//!
//! One [`ChunkPipeline::run`] processes one document. Every failure aborts
//! the run before the store is touched, so a document is either written in
//! full by a single upsert or not at all.
//!
//! # Flow
//!
//! 1. Validate the [`ChunkingConfig`] ([`PipelineError::Configuration`]).
//! 2. Run the selected strategy; zero chunks is a
//!    [`PipelineError::SegmentationDegeneracy`].
//! 3. Embed all chunk texts in one call; vector `i` belongs to chunk `i`.
//!    Provider errors are [`PipelineError::EmbeddingUnavailable`], wrong
//!    counts or dimensions are [`PipelineError::EmbeddingShapeMismatch`].
//! 4. Build one [`StorageRecord`] per chunk with a fresh UUID.
//! 5. Ensure the collection exists, then upsert every record at once
//!    ([`PipelineError::Storage`] on failure, no retry).

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::chunk::{ChunkOutput, ChunkingConfig, ChunkingStrategy, Strategy};
use crate::embedding::Embedder;
use crate::error::PipelineError;
use crate::models::{Chunk, ChunkMetadata, EmbeddedChunk, SourceDocument, StorageRecord};
use crate::store::VectorStore;

/// Number of chunks echoed back in a [`RunSummary`].
pub const PREVIEW_CHUNKS: usize = 3;
/// Preview text is cut to this many chars.
pub const PREVIEW_CHARS: usize = 200;

/// A short view of one stored chunk.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkPreview {
    pub chunk_id: String,
    pub text: String,
    pub start_char: usize,
    pub end_char: usize,
    pub metadata: ChunkMetadata,
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub document_id: String,
    pub collection: String,
    pub strategy: ChunkingStrategy,
    pub total_chunks: usize,
    pub semantic_fallback: bool,
    pub embedding_model: String,
    pub record_ids: Vec<String>,
    pub preview: Vec<ChunkPreview>,
}

/// Ties a chunking strategy to an embedder and a vector store.
pub struct ChunkPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
    dims: usize,
}

impl ChunkPipeline {
    /// `dims` is the configured embedding dimension; every vector must match it.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
        dims: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            collection: collection.into(),
            dims,
        }
    }

    /// Validate `config` and chunk the document without embedding or storing.
    pub async fn chunk(
        &self,
        doc: &SourceDocument,
        config: &ChunkingConfig,
    ) -> Result<ChunkOutput, PipelineError> {
        chunk_document(doc, config, self.embedder.as_ref()).await
    }

    /// Embed all chunk texts in a single call and pair vectors with chunks.
    pub async fn embed(&self, chunks: Vec<Chunk>) -> Result<Vec<EmbeddedChunk>, PipelineError> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self
            .embedder
            .embed(&texts)
            .await
            .map_err(|e| PipelineError::EmbeddingUnavailable(format!("{:#}", e)))?;

        if vectors.len() != chunks.len() {
            return Err(PipelineError::EmbeddingShapeMismatch {
                what: "vectors",
                expected: chunks.len(),
                actual: vectors.len(),
            });
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dims) {
            return Err(PipelineError::EmbeddingShapeMismatch {
                what: "dimensions",
                expected: self.dims,
                actual: bad.len(),
            });
        }

        Ok(chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddedChunk { chunk, vector })
            .collect())
    }

    /// Process one document end to end.
    pub async fn run(
        &self,
        doc: &SourceDocument,
        config: &ChunkingConfig,
    ) -> Result<RunSummary, PipelineError> {
        let output = self.chunk(doc, config).await?;
        let semantic_fallback = output.semantic_fallback;
        let embedded = self.embed(output.chunks).await?;
        let records = build_records(doc, embedded);

        self.store
            .ensure_collection(&self.collection, self.dims)
            .await
            .map_err(|e| PipelineError::Storage(format!("{:#}", e)))?;
        self.store
            .upsert(&self.collection, &records)
            .await
            .map_err(|e| PipelineError::Storage(format!("{:#}", e)))?;

        info!(
            document = %doc.id,
            strategy = %config.strategy,
            chunks = records.len(),
            semantic_fallback,
            collection = %self.collection,
            "document stored"
        );

        Ok(RunSummary {
            document_id: doc.id.clone(),
            collection: self.collection.clone(),
            strategy: config.strategy,
            total_chunks: records.len(),
            semantic_fallback,
            embedding_model: self.embedder.model_name().to_string(),
            record_ids: records.iter().map(|r| r.id.clone()).collect(),
            preview: records.iter().take(PREVIEW_CHUNKS).map(preview).collect(),
        })
    }
}

/// Validate `config` and run its strategy over `doc`.
///
/// Blank documents and strategies that yield nothing are
/// [`PipelineError::SegmentationDegeneracy`]. Only the semantic strategy
/// calls `embedder`.
pub async fn chunk_document(
    doc: &SourceDocument,
    config: &ChunkingConfig,
    embedder: &dyn Embedder,
) -> Result<ChunkOutput, PipelineError> {
    let strategy = Strategy::from_config(config)?;

    if doc.text.trim().is_empty() {
        return Err(PipelineError::SegmentationDegeneracy(format!(
            "document {} has no text content",
            doc.id
        )));
    }

    let output = strategy.produce(&doc.text, embedder).await;
    if output.chunks.is_empty() {
        return Err(PipelineError::SegmentationDegeneracy(format!(
            "{} strategy produced zero chunks for document {}",
            strategy.kind(),
            doc.id
        )));
    }
    Ok(output)
}

/// Turn embedded chunks into storage records, preserving order.
pub fn build_records(doc: &SourceDocument, embedded: Vec<EmbeddedChunk>) -> Vec<StorageRecord> {
    let doc_fields = doc.payload_fields();
    embedded
        .into_iter()
        .map(|EmbeddedChunk { chunk, vector }| {
            let mut metadata = chunk.metadata;
            metadata.insert("chunk_index".to_string(), chunk.index.into());
            for (key, value) in &doc_fields {
                metadata.insert(key.clone(), value.clone());
            }
            StorageRecord {
                id: Uuid::new_v4().to_string(),
                document_id: doc.id.clone(),
                text: chunk.text,
                start_char: chunk.start_char,
                end_char: chunk.end_char,
                metadata,
                vector,
            }
        })
        .collect()
}

fn preview(record: &StorageRecord) -> ChunkPreview {
    let text = if record.text.chars().count() > PREVIEW_CHARS {
        let cut: String = record.text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        record.text.clone()
    };
    ChunkPreview {
        chunk_id: record.id.clone(),
        text,
        start_char: record.start_char,
        end_char: record.end_char,
        metadata: record.metadata.clone(),
    }
}
