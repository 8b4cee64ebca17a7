//! Fixed-size sliding-window chunker.
//!
//! Windows are `chunk_size` chars wide and advance by
//! `chunk_size - chunk_overlap`, so consecutive chunks share exactly
//! `chunk_overlap` chars. The last window may be shorter. Windows are not
//! trimmed: the union of all spans is exactly `[0, len)`.

use serde_json::Map;

use super::{make_chunk, CharText, ChunkingStrategy};
use crate::error::ConfigError;
use crate::models::Chunk;

/// Sliding-window chunker over chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedChunker {
    /// Create a chunker, rejecting windows that would not advance.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::Zero {
                field: "chunk_size",
            });
        }
        if chunk_overlap >= chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                overlap: chunk_overlap,
                size: chunk_size,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Window spans `[start, end)` over a text of `len` chars.
    ///
    /// Empty for `len == 0`.
    pub fn spans(&self, len: usize) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        if len == 0 {
            return spans;
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(len);
            spans.push((start, end));
            if end >= len {
                break;
            }
            start += step;
        }
        spans
    }

    /// Split `text` into fixed windows tagged `chunking_strategy = "fixed"`.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let chars = CharText::new(text);
        let chunks: Vec<Chunk> = self
            .spans(chars.char_len())
            .into_iter()
            .enumerate()
            .map(|(index, (start, end))| {
                make_chunk(
                    &chars,
                    start,
                    end,
                    index,
                    ChunkingStrategy::Fixed,
                    Map::new(),
                )
            })
            .collect();
        tracing::debug!(
            chunks = chunks.len(),
            chunk_size = self.chunk_size,
            overlap = self.chunk_overlap,
            "fixed chunking complete"
        );
        chunks
    }
}
