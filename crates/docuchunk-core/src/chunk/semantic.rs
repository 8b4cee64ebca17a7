//! Similarity-driven sentence merging.
//!
//! The text is segmented into sentences, every sentence is embedded in one
//! batch, and adjacent sentences are merged while the cosine similarity of
//! each sentence to the one before it stays at or above the threshold. The
//! comparison is always against the previous sentence, never a running
//! centroid, so the grouping depends only on consecutive pairs.
//!
//! Similarities are clamped to `[0, 1]` before comparison: a threshold of
//! `0.0` merges everything and raising the threshold can only add splits.
//!
//! If the embedder fails or returns a malformed batch, the chunker degrades
//! to one chunk per sentence and reports it through
//! [`ChunkOutput::semantic_fallback`] instead of returning an error.

use std::ops::Range;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::segment::{segment, SentenceSpan};
use super::{make_chunk, CharText, ChunkOutput, ChunkingStrategy};
use crate::embedding::{cosine_similarity, uniform_dims, Embedder};
use crate::error::ConfigError;
use crate::models::Chunk;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SemanticChunker {
    threshold: f64,
}

impl SemanticChunker {
    pub fn new(threshold: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::OutOfRange {
                field: "semantic_threshold",
                value: threshold,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self { threshold })
    }

    /// Chunk `text`, embedding its sentences through `embedder`.
    pub async fn chunk(&self, text: &str, embedder: &dyn Embedder) -> ChunkOutput {
        let chars = CharText::new(text);
        let sentences = segment(text);

        if sentences.len() <= 1 {
            let chunks = sentences
                .first()
                .map(|s| vec![semantic_chunk(&chars, s.start, s.end, 0, 1, false)])
                .unwrap_or_default();
            return ChunkOutput::exact(chunks);
        }

        let sentence_texts: Vec<String> = sentences
            .iter()
            .map(|s| chars.slice(s.start, s.end).to_string())
            .collect();

        let vectors = match embedder.embed(&sentence_texts).await {
            Ok(vectors) if uniform_dims(&vectors, sentences.len()).is_some() => vectors,
            Ok(vectors) => {
                warn!(
                    sentences = sentences.len(),
                    vectors = vectors.len(),
                    "malformed sentence embeddings; falling back to sentence chunks"
                );
                return sentence_fallback(&chars, &sentences);
            }
            Err(e) => {
                warn!(error = %e, "sentence embedding failed; falling back to sentence chunks");
                return sentence_fallback(&chars, &sentences);
            }
        };

        let chunks: Vec<Chunk> = self
            .group(&vectors)
            .into_iter()
            .enumerate()
            .map(|(index, group)| {
                let start = sentences[group.start].start;
                let end = sentences[group.end - 1].end;
                semantic_chunk(&chars, start, end, index, group.len(), false)
            })
            .collect();

        debug!(
            sentences = sentences.len(),
            chunks = chunks.len(),
            threshold = self.threshold,
            "semantic chunking complete"
        );
        ChunkOutput::exact(chunks)
    }

    /// Group consecutive sentence indices by adjacent-pair similarity.
    ///
    /// `vectors[i]` is the embedding of sentence `i`. Returns contiguous,
    /// non-empty index ranges covering `0..vectors.len()`.
    pub fn group(&self, vectors: &[Vec<f32>]) -> Vec<Range<usize>> {
        let mut groups = Vec::new();
        if vectors.is_empty() {
            return groups;
        }

        let mut open = 0;
        for i in 1..vectors.len() {
            let similarity =
                f64::from(cosine_similarity(&vectors[i - 1], &vectors[i])).clamp(0.0, 1.0);
            let merge = similarity >= self.threshold;
            if !merge {
                groups.push(open..i);
                open = i;
            }
        }
        groups.push(open..vectors.len());
        groups
    }
}

/// One chunk per sentence, flagged as a fallback.
fn sentence_fallback(chars: &CharText<'_>, sentences: &[SentenceSpan]) -> ChunkOutput {
    let chunks = sentences
        .iter()
        .enumerate()
        .map(|(index, s)| semantic_chunk(chars, s.start, s.end, index, 1, true))
        .collect();
    ChunkOutput {
        chunks,
        semantic_fallback: true,
    }
}

fn semantic_chunk(
    chars: &CharText<'_>,
    start: usize,
    end: usize,
    index: usize,
    num_sentences: usize,
    fallback: bool,
) -> Chunk {
    let mut metadata = Map::new();
    metadata.insert("num_sentences".to_string(), Value::from(num_sentences));
    metadata.insert("semantic_fallback".to_string(), Value::from(fallback));
    make_chunk(chars, start, end, index, ChunkingStrategy::Semantic, metadata)
}
