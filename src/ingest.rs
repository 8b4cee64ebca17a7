//! File ingestion: read → guard → extract → chunk pipeline.
//!
//! [`ingest_file`] runs the whole pipeline against a file on disk and
//! [`chunk_file`] stops after chunking (no embedding of chunks, nothing
//! stored). Both take their collaborators as trait objects so tests can
//! swap in fakes; [`run_ingest`] and [`run_chunk`] are the CLI entry points
//! that build the configured providers and print results.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use docuchunk_core::chunk::{ChunkingConfig, ChunkingStrategy};
use docuchunk_core::embedding::Embedder;
use docuchunk_core::models::{Chunk, SourceDocument};
use docuchunk_core::pipeline::{chunk_document, ChunkPipeline, RunSummary};
use docuchunk_core::store::VectorStore;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{Config, IngestConfig};
use crate::embedding::create_provider;
use crate::extract::{extract_text, Format};
use crate::qdrant::QdrantStore;

/// Per-run overrides of the `[chunking]` section, typically from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct ChunkOverrides {
    pub strategy: Option<ChunkingStrategy>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub semantic_threshold: Option<f64>,
    pub parent_chunk_size: Option<usize>,
    pub child_chunk_size: Option<usize>,
    pub no_parents: bool,
}

impl ChunkOverrides {
    /// Copy of `base` with every set override applied. Validation happens
    /// later, inside the pipeline.
    pub fn apply(&self, base: &ChunkingConfig) -> ChunkingConfig {
        let mut config = base.clone();
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(size) = self.chunk_size {
            config.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.chunk_overlap = overlap;
        }
        if let Some(threshold) = self.semantic_threshold {
            config.semantic_threshold = threshold;
        }
        if let Some(size) = self.parent_chunk_size {
            config.parent_chunk_size = size;
        }
        if let Some(size) = self.child_chunk_size {
            config.child_chunk_size = size;
        }
        if self.no_parents {
            config.include_parents = false;
        }
        config
    }
}

/// Outcome of [`ingest_file`].
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub file: String,
    pub ingested_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: RunSummary,
}

/// Outcome of [`chunk_file`].
#[derive(Debug, Clone, Serialize)]
pub struct ChunkReport {
    pub file: String,
    pub strategy: ChunkingStrategy,
    pub semantic_fallback: bool,
    pub chunks: Vec<Chunk>,
}

/// Read a file, enforce the upload guards, and extract its text.
///
/// The extension allow-list and size limit are checked before any bytes
/// are parsed.
pub fn load_document(path: &Path, ingest: &IngestConfig) -> Result<SourceDocument> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    if !ingest.allows_extension(ext) {
        bail!(
            "File type not allowed: {} (allowed: {})",
            path.display(),
            ingest.allowed_extensions.join(", ")
        );
    }

    let size = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    if size > ingest.max_file_size_bytes() {
        bail!(
            "File too large: {} is {} bytes (limit {} MB)",
            path.display(),
            size,
            ingest.max_file_size_mb
        );
    }

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let format = Format::from_path(path)?;
    let text = extract_text(&bytes, format)
        .with_context(|| format!("Failed to extract text from {}", path.display()))?;

    let mut doc = SourceDocument::new(Uuid::new_v4().to_string(), text).with_size(size);
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        doc = doc.with_filename(name);
    }
    Ok(doc)
}

/// Full pipeline over one file.
pub async fn ingest_file(
    config: &Config,
    path: &Path,
    overrides: &ChunkOverrides,
    collection: Option<&str>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
) -> Result<IngestReport> {
    let doc = load_document(path, &config.ingest)?;
    let chunking = overrides.apply(&config.chunking);
    let collection = collection.unwrap_or(config.vector_store.collection.as_str());

    let pipeline = ChunkPipeline::new(embedder, store, collection, config.embedding_dims());
    let summary = pipeline.run(&doc, &chunking).await?;

    Ok(IngestReport {
        file: path.display().to_string(),
        ingested_at: Utc::now(),
        summary,
    })
}

/// Chunk one file without storing anything.
///
/// Goes through the same validation and degeneracy checks as
/// [`ingest_file`], so failures carry a [`PipelineError`] kind. The
/// semantic strategy still calls `embedder` for sentence vectors; a
/// failing embedder shows up as `semantic_fallback`.
///
/// [`PipelineError`]: docuchunk_core::error::PipelineError
pub async fn chunk_file(
    config: &Config,
    path: &Path,
    overrides: &ChunkOverrides,
    embedder: &dyn Embedder,
) -> Result<ChunkReport> {
    let doc = load_document(path, &config.ingest)?;
    let chunking = overrides.apply(&config.chunking);
    let output = chunk_document(&doc, &chunking, embedder).await?;

    Ok(ChunkReport {
        file: path.display().to_string(),
        strategy: chunking.strategy,
        semantic_fallback: output.semantic_fallback,
        chunks: output.chunks,
    })
}

/// `docuchunk ingest <file>`.
pub async fn run_ingest(
    config: &Config,
    path: &Path,
    overrides: &ChunkOverrides,
    collection: Option<&str>,
    json: bool,
) -> Result<()> {
    let embedder = create_provider(&config.embedding)?;
    let store: Arc<dyn VectorStore> = Arc::new(QdrantStore::new(&config.vector_store)?);

    let report = ingest_file(config, path, overrides, collection, embedder, store).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let summary = &report.summary;
    println!("ingest {}", report.file);
    println!("  document: {}", summary.document_id);
    println!("  strategy: {}", summary.strategy);
    println!("  chunks: {}", summary.total_chunks);
    if summary.semantic_fallback {
        println!("  semantic fallback: sentence boundaries");
    }
    println!("  embedding model: {}", summary.embedding_model);
    println!("  collection: {}", summary.collection);
    for p in &summary.preview {
        println!();
        println!("  [{}..{}] {}", p.start_char, p.end_char, p.chunk_id);
        println!("    {}", p.text.replace('\n', " "));
    }
    println!("ok");
    Ok(())
}

/// `docuchunk chunk <file>`.
pub async fn run_chunk(
    config: &Config,
    path: &Path,
    overrides: &ChunkOverrides,
    json: bool,
) -> Result<()> {
    let embedder = create_provider(&config.embedding)?;
    let report = chunk_file(config, path, overrides, embedder.as_ref()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("chunk {} (dry-run)", report.file);
    println!("  strategy: {}", report.strategy);
    println!("  chunks: {}", report.chunks.len());
    if report.semantic_fallback {
        println!("  semantic fallback: sentence boundaries");
    }
    for c in &report.chunks {
        let tier = c
            .meta_str("tier")
            .map(|t| format!(" {}", t))
            .unwrap_or_default();
        println!();
        println!("  #{}{} [{}..{}]", c.index, tier, c.start_char, c.end_char);
        println!("    {}", c.text.replace('\n', " "));
    }
    Ok(())
}
