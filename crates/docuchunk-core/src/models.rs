//! Core data models that flow through the chunk pipeline.
//!
//! Raw text enters as a [`SourceDocument`], is split into [`Chunk`]s by one
//! strategy, paired with a vector as an [`EmbeddedChunk`], and leaves as a
//! [`StorageRecord`] handed to the vector store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Scalar key/value metadata attached to every chunk.
pub type ChunkMetadata = Map<String, Value>;

/// Plain text of one document plus what the extraction step knew about it.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Document identifier, stamped on every storage record as `file_id`.
    pub id: String,
    /// Original file name, if the text came from a file.
    pub filename: Option<String>,
    /// Declared size of the original document in bytes.
    pub size_bytes: Option<u64>,
    /// Extracted plain text.
    pub text: String,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filename: None,
            size_bytes: None,
            text: text.into(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    /// Document-level fields merged into every record payload.
    pub fn payload_fields(&self) -> ChunkMetadata {
        let mut fields = Map::new();
        fields.insert("file_id".to_string(), Value::from(self.id.clone()));
        if let Some(name) = &self.filename {
            fields.insert("filename".to_string(), Value::from(name.clone()));
        }
        if let Some(size) = self.size_bytes {
            fields.insert("file_size".to_string(), Value::from(size));
        }
        fields
    }
}

/// A contiguous text fragment with char offsets into its source document.
///
/// `text` is always exactly the document's chars in `[start_char, end_char)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub start_char: usize,
    pub end_char: usize,
    /// Position among chunks of the same tier, ordered by `start_char`.
    pub index: usize,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Length of the chunk in chars.
    pub fn char_len(&self) -> usize {
        self.end_char - self.start_char
    }

    /// Look up a string metadata value.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Look up an unsigned integer metadata value.
    pub fn meta_u64(&self, key: &str) -> Option<u64> {
        self.metadata.get(key).and_then(Value::as_u64)
    }

    /// Look up a boolean metadata value.
    pub fn meta_bool(&self, key: &str) -> Option<bool> {
        self.metadata.get(key).and_then(Value::as_bool)
    }
}

/// A [`Chunk`] paired with its embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// One point written to the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRecord {
    /// Freshly generated UUID for this point.
    pub id: String,
    pub document_id: String,
    pub text: String,
    pub start_char: usize,
    pub end_char: usize,
    /// Chunk metadata merged with the document's payload fields.
    pub metadata: ChunkMetadata,
    pub vector: Vec<f32>,
}

impl StorageRecord {
    /// Flat JSON payload stored next to the vector.
    pub fn payload(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("text".to_string(), Value::from(self.text.clone()));
        payload.insert("start_char".to_string(), Value::from(self.start_char));
        payload.insert("end_char".to_string(), Value::from(self.end_char));
        payload.insert(
            "document_id".to_string(),
            Value::from(self.document_id.clone()),
        );
        for (key, value) in &self.metadata {
            payload.insert(key.clone(), value.clone());
        }
        Value::Object(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_fields_skip_missing() {
        let doc = SourceDocument::new("doc-1", "hello");
        let fields = doc.payload_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["file_id"], "doc-1");
    }

    #[test]
    fn test_payload_fields_full() {
        let doc = SourceDocument::new("doc-1", "hello")
            .with_filename("notes.md")
            .with_size(5);
        let fields = doc.payload_fields();
        assert_eq!(fields["filename"], "notes.md");
        assert_eq!(fields["file_size"], 5);
    }

    #[test]
    fn test_record_payload_merges_metadata() {
        let mut metadata = Map::new();
        metadata.insert("chunking_strategy".to_string(), Value::from("fixed"));
        let record = StorageRecord {
            id: "r1".to_string(),
            document_id: "doc-1".to_string(),
            text: "abc".to_string(),
            start_char: 3,
            end_char: 6,
            metadata,
            vector: vec![0.1, 0.2],
        };
        let payload = record.payload();
        assert_eq!(payload["text"], "abc");
        assert_eq!(payload["start_char"], 3);
        assert_eq!(payload["end_char"], 6);
        assert_eq!(payload["document_id"], "doc-1");
        assert_eq!(payload["chunking_strategy"], "fixed");
    }
}
