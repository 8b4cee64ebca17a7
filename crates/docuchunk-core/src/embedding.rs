//! Embedding capability trait and vector utilities.
//!
//! Defines the [`Embedder`] trait that every embedding backend implements.
//! The chunking strategies and the pipeline only ever see this trait; the
//! concrete providers (OpenAI, Ollama, local models) live in the application
//! crate.

use anyhow::Result;
use async_trait::async_trait;

/// An embedding backend.
///
/// `embed` must return exactly one vector per input text, in input order,
/// or fail as a whole. Callers verify the shape of the response.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1536`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors or vectors of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Check that `vectors` holds `expected` non-empty vectors of one length.
///
/// Returns the shared dimensionality on success.
pub fn uniform_dims(vectors: &[Vec<f32>], expected: usize) -> Option<usize> {
    if vectors.len() != expected {
        return None;
    }
    let dims = vectors.first().map(Vec::len)?;
    if dims == 0 || vectors.iter().any(|v| v.len() != dims) {
        return None;
    }
    Some(dims)
}
