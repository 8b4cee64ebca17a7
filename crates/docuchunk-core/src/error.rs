//! Error taxonomy for chunking and pipeline runs.
//!
//! [`ConfigError`] covers invalid chunking parameters and is raised before any
//! chunking work starts. [`PipelineError`] is what a pipeline run reports;
//! every variant aborts the run before anything is written to the store.

use serde::Serialize;
use thiserror::Error;

/// Invalid or out-of-range chunking parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be greater than 0")]
    Zero { field: &'static str },

    #[error("chunk_overlap ({overlap}) must be less than chunk_size ({size})")]
    OverlapTooLarge { overlap: usize, size: usize },

    #[error("child_chunk_size ({child}) must not exceed parent_chunk_size ({parent})")]
    ChildExceedsParent { child: usize, parent: usize },

    #[error("unknown chunking strategy: '{0}'. Use fixed, semantic, or hierarchical.")]
    UnknownStrategy(String),
}

/// Failure of a single pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid chunking configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("document produced no chunks: {0}")]
    SegmentationDegeneracy(String),

    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("embedding shape mismatch: expected {expected} {what}, got {actual}")]
    EmbeddingShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("vector store write failed: {0}")]
    Storage(String),
}

impl PipelineError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Configuration(_) => "configuration_error",
            PipelineError::SegmentationDegeneracy(_) => "segmentation_degeneracy",
            PipelineError::EmbeddingUnavailable(_) => "embedding_unavailable",
            PipelineError::EmbeddingShapeMismatch { .. } => "embedding_shape_mismatch",
            PipelineError::Storage(_) => "storage_failure",
        }
    }

    /// Structured form for JSON output.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            detail: self.to_string(),
        }
    }
}

/// `{ kind, detail }` pair reported to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::OutOfRange {
            field: "chunk_size",
            value: 50.0,
            min: 100.0,
            max: 4000.0,
        };
        assert_eq!(err.to_string(), "chunk_size must be in [100, 4000], got 50");

        let err = ConfigError::OverlapTooLarge {
            overlap: 200,
            size: 100,
        };
        assert_eq!(
            err.to_string(),
            "chunk_overlap (200) must be less than chunk_size (100)"
        );
    }

    #[test]
    fn test_config_error_converts_to_pipeline_error() {
        let err: PipelineError = ConfigError::Zero {
            field: "parent_chunk_size",
        }
        .into();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert_eq!(err.kind(), "configuration_error");
        assert!(err.to_string().contains("parent_chunk_size"));
    }

    #[test]
    fn test_shape_mismatch_display() {
        let err = PipelineError::EmbeddingShapeMismatch {
            what: "vectors",
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "embedding shape mismatch: expected 3 vectors, got 2"
        );
    }

    #[test]
    fn test_report_kinds() {
        let cases = [
            (
                PipelineError::SegmentationDegeneracy("empty".to_string()),
                "segmentation_degeneracy",
            ),
            (
                PipelineError::EmbeddingUnavailable("timeout".to_string()),
                "embedding_unavailable",
            ),
            (
                PipelineError::Storage("connection refused".to_string()),
                "storage_failure",
            ),
        ];
        for (err, kind) in cases {
            let report = err.report();
            assert_eq!(report.kind, kind);
            assert_eq!(report.detail, err.to_string());
        }
    }
}
