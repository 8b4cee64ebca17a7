//! End-to-end pipeline runs through the public API, with deterministic
//! embedders and the in-memory store.

use anyhow::{bail, Result};
use async_trait::async_trait;
use docuchunk_core::chunk::{ChunkingConfig, ChunkingStrategy};
use docuchunk_core::embedding::Embedder;
use docuchunk_core::error::PipelineError;
use docuchunk_core::models::{SourceDocument, StorageRecord};
use docuchunk_core::pipeline::ChunkPipeline;
use docuchunk_core::store::memory::InMemoryVectorStore;
use docuchunk_core::store::{CollectionInfo, VectorStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const DIMS: usize = 3;

/// Maps each text onto one of three axes by keyword, so sentences about the
/// same topic are identical vectors.
struct TopicEmbedder {
    calls: AtomicUsize,
}

impl TopicEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

fn topic_vector(text: &str) -> Vec<f32> {
    let t = text.to_lowercase();
    if t.contains("cat") || t.contains("kitten") {
        vec![1.0, 0.0, 0.0]
    } else if t.contains("rust") || t.contains("cargo") {
        vec![0.0, 1.0, 0.0]
    } else {
        vec![0.0, 0.0, 1.0]
    }
}

#[async_trait]
impl Embedder for TopicEmbedder {
    fn model_name(&self) -> &str {
        "topic"
    }
    fn dims(&self) -> usize {
        DIMS
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| topic_vector(t)).collect())
    }
}

/// Fails its first `failures` calls, then behaves like [`TopicEmbedder`].
struct FlakyEmbedder {
    failures: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl Embedder for FlakyEmbedder {
    fn model_name(&self) -> &str {
        "flaky"
    }
    fn dims(&self) -> usize {
        DIMS
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            bail!("connection refused");
        }
        Ok(texts.iter().map(|t| topic_vector(t)).collect())
    }
}

/// Returns one vector fewer than asked for.
struct ShortEmbedder;

#[async_trait]
impl Embedder for ShortEmbedder {
    fn model_name(&self) -> &str {
        "short"
    }
    fn dims(&self) -> usize {
        DIMS
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .skip(1)
            .map(|_| vec![0.0; DIMS])
            .collect())
    }
}

/// Accepts collection creation but rejects every write.
struct ReadOnlyStore;

#[async_trait]
impl VectorStore for ReadOnlyStore {
    async fn ensure_collection(&self, _collection: &str, _dims: usize) -> Result<()> {
        Ok(())
    }
    async fn upsert(&self, _collection: &str, _records: &[StorageRecord]) -> Result<()> {
        bail!("collection is read-only")
    }
    async fn get_collection_info(&self, _collection: &str) -> Result<Option<CollectionInfo>> {
        Ok(None)
    }
    async fn list_collections(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
    async fn delete_collection(&self, _collection: &str) -> Result<()> {
        Ok(())
    }
}

const ARTICLE: &str = "Cats sleep most of the day. Kittens chase string. \
Rust compiles to native code. Cargo manages dependencies. \
Oceans cover the planet. Tides follow the moon.";

fn semantic_config() -> ChunkingConfig {
    ChunkingConfig {
        strategy: ChunkingStrategy::Semantic,
        semantic_threshold: 0.7,
        ..ChunkingConfig::default()
    }
}

#[tokio::test]
async fn semantic_run_groups_by_topic() {
    let store = Arc::new(InMemoryVectorStore::new());
    let embedder = Arc::new(TopicEmbedder::new());
    let pipeline = ChunkPipeline::new(embedder.clone(), store.clone(), "articles", DIMS);

    let doc = SourceDocument::new("doc-1", ARTICLE);
    let summary = pipeline.run(&doc, &semantic_config()).await.unwrap();

    assert_eq!(summary.total_chunks, 3);
    assert!(!summary.semantic_fallback);
    assert_eq!(summary.embedding_model, "topic");
    // One call for sentence vectors, one for chunk vectors.
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);

    let records = store.records("articles");
    assert_eq!(records[0].text, "Cats sleep most of the day. Kittens chase string.");
    assert_eq!(records[1].text, "Rust compiles to native code. Cargo manages dependencies.");
    for r in &records {
        let chars: String = ARTICLE
            .chars()
            .skip(r.start_char)
            .take(r.end_char - r.start_char)
            .collect();
        assert_eq!(chars, r.text);
        assert_eq!(r.metadata["chunking_strategy"], "semantic");
        assert_eq!(r.metadata["num_sentences"], 2);
    }
}

#[tokio::test]
async fn semantic_falls_back_when_sentence_embedding_fails() {
    let store = Arc::new(InMemoryVectorStore::new());
    let embedder = Arc::new(FlakyEmbedder {
        failures: 1,
        calls: AtomicUsize::new(0),
    });
    let pipeline = ChunkPipeline::new(embedder, store.clone(), "articles", DIMS);

    let summary = pipeline
        .run(&SourceDocument::new("doc-1", ARTICLE), &semantic_config())
        .await
        .unwrap();

    // One chunk per sentence.
    assert_eq!(summary.total_chunks, 6);
    assert!(summary.semantic_fallback);
    assert!(store
        .records("articles")
        .iter()
        .all(|r| r.metadata["semantic_fallback"] == true));
}

#[tokio::test]
async fn embedding_failure_stores_nothing() {
    let store = Arc::new(InMemoryVectorStore::new());
    let embedder = Arc::new(FlakyEmbedder {
        failures: usize::MAX,
        calls: AtomicUsize::new(0),
    });
    let pipeline = ChunkPipeline::new(embedder, store.clone(), "articles", DIMS);

    let err = pipeline
        .run(
            &SourceDocument::new("doc-1", ARTICLE),
            &ChunkingConfig::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "embedding_unavailable");
    assert!(err.to_string().contains("connection refused"));
    assert_eq!(store.upsert_calls(), 0);
    assert!(store.list_collections().await.unwrap().is_empty());
}

#[tokio::test]
async fn vector_count_mismatch_is_atomic() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = ChunkPipeline::new(Arc::new(ShortEmbedder), store.clone(), "articles", DIMS);

    let doc = SourceDocument::new("doc-1", "w".repeat(1200));
    let err = pipeline
        .run(&doc, &ChunkingConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::EmbeddingShapeMismatch {
            what: "vectors",
            expected: 3,
            actual: 2
        }
    ));
    assert_eq!(err.kind(), "embedding_shape_mismatch");
    assert_eq!(store.upsert_calls(), 0);
    assert!(store.records("articles").is_empty());
}

#[tokio::test]
async fn storage_failure_is_reported() {
    let pipeline = ChunkPipeline::new(
        Arc::new(TopicEmbedder::new()),
        Arc::new(ReadOnlyStore),
        "articles",
        DIMS,
    );
    let err = pipeline
        .run(
            &SourceDocument::new("doc-1", ARTICLE),
            &ChunkingConfig::default(),
        )
        .await
        .unwrap_err();

    let report = err.report();
    assert_eq!(report.kind, "storage_failure");
    assert!(report.detail.contains("read-only"));
}

#[tokio::test]
async fn invalid_config_fails_before_embedding() {
    let store = Arc::new(InMemoryVectorStore::new());
    let embedder = Arc::new(TopicEmbedder::new());
    let pipeline = ChunkPipeline::new(embedder.clone(), store.clone(), "articles", DIMS);

    let bad = [
        ChunkingConfig {
            chunk_size: 50,
            ..ChunkingConfig::default()
        },
        ChunkingConfig {
            chunk_size: 200,
            chunk_overlap: 200,
            ..ChunkingConfig::default()
        },
        ChunkingConfig {
            strategy: ChunkingStrategy::Semantic,
            semantic_threshold: 1.5,
            ..ChunkingConfig::default()
        },
        ChunkingConfig {
            strategy: ChunkingStrategy::Hierarchical,
            parent_chunk_size: 500,
            child_chunk_size: 1000,
            ..ChunkingConfig::default()
        },
    ];

    for config in &bad {
        let err = pipeline
            .run(&SourceDocument::new("doc-1", ARTICLE), config)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "configuration_error", "{:?}", config);
    }
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.upsert_calls(), 0);
}

#[tokio::test]
async fn hierarchical_run_links_children_to_parents() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = ChunkPipeline::new(
        Arc::new(TopicEmbedder::new()),
        store.clone(),
        "articles",
        DIMS,
    );
    let config = ChunkingConfig {
        strategy: ChunkingStrategy::Hierarchical,
        parent_chunk_size: 2000,
        child_chunk_size: 500,
        ..ChunkingConfig::default()
    };

    let summary = pipeline
        .run(&SourceDocument::new("doc-1", "h".repeat(4500)), &config)
        .await
        .unwrap();
    // 3 parents + 4 + 4 + 1 children.
    assert_eq!(summary.total_chunks, 12);

    let records = store.records("articles");
    let parents: Vec<&StorageRecord> = records
        .iter()
        .filter(|r| r.metadata["tier"] == "parent")
        .collect();
    let children: Vec<&StorageRecord> = records
        .iter()
        .filter(|r| r.metadata["tier"] == "child")
        .collect();
    assert_eq!(parents.len(), 3);
    assert_eq!(children.len(), 9);

    for child in children {
        let parent = parents
            .iter()
            .find(|p| p.metadata["parent_id"] == child.metadata["parent_id"])
            .expect("child must reference an emitted parent");
        assert!(child.start_char >= parent.start_char);
        assert!(child.end_char <= parent.end_char);
        assert_eq!(child.metadata["parent_index"], parent.metadata["parent_index"]);
    }
}

#[tokio::test]
async fn hierarchical_without_parents_stores_children_only() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = ChunkPipeline::new(
        Arc::new(TopicEmbedder::new()),
        store.clone(),
        "articles",
        DIMS,
    );
    let config = ChunkingConfig {
        strategy: ChunkingStrategy::Hierarchical,
        parent_chunk_size: 2000,
        child_chunk_size: 500,
        include_parents: false,
        ..ChunkingConfig::default()
    };

    let summary = pipeline
        .run(&SourceDocument::new("doc-1", "h".repeat(4500)), &config)
        .await
        .unwrap();
    assert_eq!(summary.total_chunks, 9);
    assert!(store
        .records("articles")
        .iter()
        .all(|r| r.metadata["tier"] == "child"));
}
