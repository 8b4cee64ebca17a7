//! Two-tier parent/child chunking.
//!
//! Parents are fixed windows of `parent_chunk_size` chars with no overlap.
//! Each parent is re-chunked into fixed children of `child_chunk_size` chars,
//! also without overlap, whose offsets are translated back into document
//! coordinates.
//!
//! Children refer to their parent by value: every child carries the parent's
//! `parent_id` (a SHA-256 of the parent's offsets and text, stable across
//! runs) and `parent_index`. Parents are emitted ahead of their children when
//! `include_parents` is set; chunk indices count separately per tier.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use super::{make_chunk, CharText, ChunkingStrategy, FixedChunker};
use crate::error::ConfigError;
use crate::models::Chunk;

/// Metadata value of `tier` on parent chunks.
pub const TIER_PARENT: &str = "parent";
/// Metadata value of `tier` on child chunks.
pub const TIER_CHILD: &str = "child";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchicalChunker {
    parent: FixedChunker,
    child: FixedChunker,
    include_parents: bool,
}

impl HierarchicalChunker {
    pub fn new(
        parent_chunk_size: usize,
        child_chunk_size: usize,
        include_parents: bool,
    ) -> Result<Self, ConfigError> {
        if parent_chunk_size == 0 {
            return Err(ConfigError::Zero {
                field: "parent_chunk_size",
            });
        }
        if child_chunk_size == 0 {
            return Err(ConfigError::Zero {
                field: "child_chunk_size",
            });
        }
        if child_chunk_size > parent_chunk_size {
            return Err(ConfigError::ChildExceedsParent {
                child: child_chunk_size,
                parent: parent_chunk_size,
            });
        }
        Ok(Self {
            parent: FixedChunker::new(parent_chunk_size, 0)?,
            child: FixedChunker::new(child_chunk_size, 0)?,
            include_parents,
        })
    }

    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let chars = CharText::new(text);
        let mut out = Vec::new();
        let mut child_count = 0;
        let parent_spans = self.parent.spans(chars.char_len());

        for (parent_index, &(p_start, p_end)) in parent_spans.iter().enumerate() {
            let parent_id = parent_id(p_start, p_end, chars.slice(p_start, p_end));

            if self.include_parents {
                let mut metadata = Map::new();
                metadata.insert("tier".to_string(), Value::from(TIER_PARENT));
                metadata.insert("parent_id".to_string(), Value::from(parent_id.clone()));
                metadata.insert("parent_index".to_string(), Value::from(parent_index));
                out.push(make_chunk(
                    &chars,
                    p_start,
                    p_end,
                    parent_index,
                    ChunkingStrategy::Hierarchical,
                    metadata,
                ));
            }

            for (child_index, (c_start, c_end)) in
                self.child.spans(p_end - p_start).into_iter().enumerate()
            {
                let mut metadata = Map::new();
                metadata.insert("tier".to_string(), Value::from(TIER_CHILD));
                metadata.insert("parent_id".to_string(), Value::from(parent_id.clone()));
                metadata.insert("parent_index".to_string(), Value::from(parent_index));
                metadata.insert("child_index".to_string(), Value::from(child_index));
                out.push(make_chunk(
                    &chars,
                    p_start + c_start,
                    p_start + c_end,
                    child_count,
                    ChunkingStrategy::Hierarchical,
                    metadata,
                ));
                child_count += 1;
            }
        }

        tracing::debug!(
            parents = parent_spans.len(),
            children = child_count,
            "hierarchical chunking complete"
        );
        out
    }
}

/// Stable identifier of a parent chunk.
pub fn parent_id(start: usize, end: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}:", start, end).as_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier<'a>(chunks: &'a [Chunk], tier: &str) -> Vec<&'a Chunk> {
        chunks
            .iter()
            .filter(|c| c.meta_str("tier") == Some(tier))
            .collect()
    }

    fn sample_text(len: usize) -> String {
        "Lorem ipsum dolor sit amet, consectetur adipiscing elit. "
            .chars()
            .cycle()
            .take(len)
            .collect()
    }

    #[test]
    fn test_example_4500_chars() {
        let text = sample_text(4500);
        let chunks = HierarchicalChunker::new(2000, 500, true).unwrap().chunk(&text);
        let parents = tier(&chunks, TIER_PARENT);
        let children = tier(&chunks, TIER_CHILD);

        let sizes: Vec<usize> = parents.iter().map(|p| p.char_len()).collect();
        assert_eq!(sizes, vec![2000, 2000, 500]);

        let per_parent: Vec<usize> = (0..3)
            .map(|i| {
                children
                    .iter()
                    .filter(|c| c.meta_u64("parent_index") == Some(i))
                    .count()
            })
            .collect();
        assert_eq!(per_parent, vec![4, 4, 1]);
        assert_eq!(children.len(), 9);
    }

    #[test]
    fn test_children_link_to_exactly_one_parent() {
        let text = sample_text(3333);
        let chunks = HierarchicalChunker::new(1000, 300, true).unwrap().chunk(&text);
        let parents = tier(&chunks, TIER_PARENT);
        for child in tier(&chunks, TIER_CHILD) {
            let matching: Vec<&&Chunk> = parents
                .iter()
                .filter(|p| p.meta_str("parent_id") == child.meta_str("parent_id"))
                .collect();
            assert_eq!(matching.len(), 1);
            let parent = matching[0];
            assert!(parent.start_char <= child.start_char);
            assert!(child.end_char <= parent.end_char);
            assert_eq!(parent.meta_u64("parent_index"), child.meta_u64("parent_index"));
        }
    }

    #[test]
    fn test_child_offsets_are_document_absolute() {
        let text = sample_text(2500);
        let chunks = HierarchicalChunker::new(1000, 400, false).unwrap().chunk(&text);
        for c in &chunks {
            let expected: String = text.chars().skip(c.start_char).take(c.char_len()).collect();
            assert_eq!(c.text, expected);
        }
        // Second parent starts at 1000; its first child must too.
        assert!(chunks
            .iter()
            .any(|c| c.start_char == 1000 && c.meta_u64("child_index") == Some(0)));
    }

    #[test]
    fn test_without_parents_only_children_emitted() {
        let text = sample_text(1200);
        let chunks = HierarchicalChunker::new(1000, 250, false).unwrap().chunk(&text);
        assert!(tier(&chunks, TIER_PARENT).is_empty());
        assert_eq!(chunks.len(), 4 + 1);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
            assert_eq!(c.meta_str("chunking_strategy"), Some("hierarchical"));
        }
    }

    #[test]
    fn test_tier_indices_are_independent() {
        let text = sample_text(2100);
        let chunks = HierarchicalChunker::new(1000, 500, true).unwrap().chunk(&text);
        let parent_indices: Vec<usize> = tier(&chunks, TIER_PARENT).iter().map(|c| c.index).collect();
        let child_indices: Vec<usize> = tier(&chunks, TIER_CHILD).iter().map(|c| c.index).collect();
        assert_eq!(parent_indices, vec![0, 1, 2]);
        assert_eq!(child_indices, (0..5).collect::<Vec<_>>());
    }

    #[test]
    fn test_parent_ids_stable_and_distinct() {
        let text = sample_text(3000);
        let chunker = HierarchicalChunker::new(1000, 500, true).unwrap();
        let a = chunker.chunk(&text);
        let b = chunker.chunk(&text);
        assert_eq!(a, b);

        let ids: Vec<&str> = tier(&a, TIER_PARENT)
            .iter()
            .filter_map(|p| p.meta_str("parent_id"))
            .collect();
        assert_eq!(ids.len(), 3);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(ids[0], parent_id(0, 1000, &text.chars().take(1000).collect::<String>()));
    }

    #[test]
    fn test_equal_sizes_allowed() {
        let chunks = HierarchicalChunker::new(500, 500, true)
            .unwrap()
            .chunk(&sample_text(900));
        assert_eq!(tier(&chunks, TIER_CHILD).len(), 2);
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(HierarchicalChunker::new(100, 200, true).is_err());
        assert!(HierarchicalChunker::new(0, 0, true).is_err());
        assert!(HierarchicalChunker::new(100, 0, true).is_err());
    }

    #[test]
    fn test_empty_text() {
        assert!(HierarchicalChunker::new(100, 50, true).unwrap().chunk("").is_empty());
    }
}
