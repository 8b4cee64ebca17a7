//! Chunking strategies and their shared configuration.
//!
//! Three strategies turn raw text into [`Chunk`]s with char offsets:
//!
//! | Strategy | Module | Output |
//! |----------|--------|--------|
//! | `fixed` | [`fixed`] | Sliding window of `chunk_size` chars with `chunk_overlap` |
//! | `semantic` | [`semantic`] | Adjacent sentences merged while their embeddings stay similar |
//! | `hierarchical` | [`hierarchical`] | Fixed parents plus parent-linked fixed children |
//!
//! [`ChunkingConfig`] is validated once, then turned into a [`Strategy`];
//! [`Strategy::produce`] is the single dispatch point over the closed set.
//!
//! # Example
//!
//! ```rust
//! use docuchunk_core::chunk::{ChunkingConfig, ChunkingStrategy, Strategy};
//!
//! let config = ChunkingConfig {
//!     strategy: ChunkingStrategy::Fixed,
//!     chunk_size: 100,
//!     chunk_overlap: 20,
//!     ..ChunkingConfig::default()
//! };
//! let strategy = Strategy::from_config(&config).unwrap();
//! let Strategy::Fixed(fixed) = strategy else { unreachable!() };
//! let chunks = fixed.chunk(&"x".repeat(250));
//! let spans: Vec<_> = chunks.iter().map(|c| (c.start_char, c.end_char)).collect();
//! assert_eq!(spans, vec![(0, 100), (80, 180), (160, 250)]);
//! ```

pub mod fixed;
pub mod hierarchical;
pub mod segment;
pub mod semantic;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::embedding::Embedder;
use crate::error::ConfigError;
use crate::models::{Chunk, ChunkMetadata};

pub use fixed::FixedChunker;
pub use hierarchical::HierarchicalChunker;
pub use semantic::SemanticChunker;

/// Allowed `chunk_size` range, in chars.
pub const CHUNK_SIZE_RANGE: (usize, usize) = (100, 4000);
/// Allowed `chunk_overlap` range, in chars.
pub const CHUNK_OVERLAP_RANGE: (usize, usize) = (0, 500);

/// The closed set of chunking strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    Fixed,
    Semantic,
    Hierarchical,
}

impl ChunkingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkingStrategy::Fixed => "fixed",
            ChunkingStrategy::Semantic => "semantic",
            ChunkingStrategy::Hierarchical => "hierarchical",
        }
    }
}

impl fmt::Display for ChunkingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkingStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(ChunkingStrategy::Fixed),
            "semantic" => Ok(ChunkingStrategy::Semantic),
            "hierarchical" => Ok(ChunkingStrategy::Hierarchical),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Immutable input to one pipeline run.
///
/// Every field has a default, so a TOML `[chunking]` section may set any
/// subset of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub strategy: ChunkingStrategy,
    /// Window width for the fixed strategy, in chars.
    pub chunk_size: usize,
    /// Overlap between consecutive fixed windows, in chars.
    pub chunk_overlap: usize,
    /// Minimum similarity for two adjacent sentences to share a chunk.
    pub semantic_threshold: f64,
    pub parent_chunk_size: usize,
    pub child_chunk_size: usize,
    /// Emit hierarchical parents alongside their children.
    pub include_parents: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkingStrategy::Fixed,
            chunk_size: 512,
            chunk_overlap: 50,
            semantic_threshold: 0.7,
            parent_chunk_size: 2048,
            child_chunk_size: 512,
            include_parents: true,
        }
    }
}

impl ChunkingConfig {
    /// Check every parameter against its documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("chunk_size", self.chunk_size, CHUNK_SIZE_RANGE)?;
        check_range("chunk_overlap", self.chunk_overlap, CHUNK_OVERLAP_RANGE)?;
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                overlap: self.chunk_overlap,
                size: self.chunk_size,
            });
        }

        if !(0.0..=1.0).contains(&self.semantic_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "semantic_threshold",
                value: self.semantic_threshold,
                min: 0.0,
                max: 1.0,
            });
        }

        if self.parent_chunk_size == 0 {
            return Err(ConfigError::Zero {
                field: "parent_chunk_size",
            });
        }
        if self.child_chunk_size == 0 {
            return Err(ConfigError::Zero {
                field: "child_chunk_size",
            });
        }
        if self.child_chunk_size > self.parent_chunk_size {
            return Err(ConfigError::ChildExceedsParent {
                child: self.child_chunk_size,
                parent: self.parent_chunk_size,
            });
        }

        Ok(())
    }
}

fn check_range(
    field: &'static str,
    value: usize,
    (min, max): (usize, usize),
) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value: value as f64,
            min: min as f64,
            max: max as f64,
        });
    }
    Ok(())
}

/// Chunks produced by one strategy invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkOutput {
    pub chunks: Vec<Chunk>,
    /// Set when the semantic strategy fell back to one chunk per sentence.
    pub semantic_fallback: bool,
}

impl ChunkOutput {
    pub(crate) fn exact(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks,
            semantic_fallback: false,
        }
    }
}

/// A validated, ready-to-run chunking strategy.
#[derive(Debug, Clone)]
pub enum Strategy {
    Fixed(FixedChunker),
    Semantic(SemanticChunker),
    Hierarchical(HierarchicalChunker),
}

impl Strategy {
    /// Validate `config` and build the strategy it selects.
    pub fn from_config(config: &ChunkingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let strategy = match config.strategy {
            ChunkingStrategy::Fixed => Strategy::Fixed(FixedChunker::new(
                config.chunk_size,
                config.chunk_overlap,
            )?),
            ChunkingStrategy::Semantic => {
                Strategy::Semantic(SemanticChunker::new(config.semantic_threshold)?)
            }
            ChunkingStrategy::Hierarchical => Strategy::Hierarchical(HierarchicalChunker::new(
                config.parent_chunk_size,
                config.child_chunk_size,
                config.include_parents,
            )?),
        };
        Ok(strategy)
    }

    pub fn kind(&self) -> ChunkingStrategy {
        match self {
            Strategy::Fixed(_) => ChunkingStrategy::Fixed,
            Strategy::Semantic(_) => ChunkingStrategy::Semantic,
            Strategy::Hierarchical(_) => ChunkingStrategy::Hierarchical,
        }
    }

    /// Split `text` into chunks.
    ///
    /// Only the semantic strategy touches `embedder`; its failures are
    /// absorbed into [`ChunkOutput::semantic_fallback`].
    pub async fn produce(&self, text: &str, embedder: &dyn Embedder) -> ChunkOutput {
        match self {
            Strategy::Fixed(chunker) => ChunkOutput::exact(chunker.chunk(text)),
            Strategy::Semantic(chunker) => chunker.chunk(text, embedder).await,
            Strategy::Hierarchical(chunker) => ChunkOutput::exact(chunker.chunk(text)),
        }
    }
}

/// Char-addressable view over a `&str`.
///
/// Offsets everywhere in this crate count chars, so slicing goes through a
/// table of byte boundaries.
pub(crate) struct CharText<'a> {
    text: &'a str,
    boundaries: Vec<usize>,
}

impl<'a> CharText<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Self { text, boundaries }
    }

    pub(crate) fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[self.boundaries[start]..self.boundaries[end]]
    }
}

/// Build a chunk over `[start, end)` with the common metadata keys set.
pub(crate) fn make_chunk(
    text: &CharText<'_>,
    start: usize,
    end: usize,
    index: usize,
    strategy: ChunkingStrategy,
    mut metadata: ChunkMetadata,
) -> Chunk {
    metadata.insert(
        "chunking_strategy".to_string(),
        Value::from(strategy.as_str()),
    );
    metadata.insert("chunk_size".to_string(), Value::from(end - start));
    Chunk {
        text: text.slice(start, end).to_string(),
        start_char: start,
        end_char: end,
        index,
        metadata,
    }
}
