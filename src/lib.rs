//! # docuchunk
//!
//! Document chunking and ingestion for retrieval-augmented generation.
//!
//! Files are extracted to plain text, split by one of three strategies
//! (fixed windows, semantic sentence grouping, hierarchical parent/child),
//! embedded in a single batch, and written to a vector collection in a
//! single upsert.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────────────┐   ┌──────────┐
//! │ Extract  │──▶│ docuchunk-core pipeline      │──▶│  Qdrant  │
//! │ pdf/docx │   │ chunk → embed → records      │   │ (upsert) │
//! └──────────┘   └──────────────┬───────────────┘   └──────────┘
//!                               │
//!                        ┌──────┴──────┐
//!                        │  Embedding  │
//!                        │ openai/etc. │
//!                        └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docuchunk chunk report.pdf --strategy semantic   # dry run, nothing stored
//! docuchunk ingest report.pdf                      # full pipeline
//! docuchunk collections info documents
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`embedding`] | Embedding providers (OpenAI, Ollama, local) |
//! | [`extract`] | Plain-text extraction from uploaded files |
//! | [`qdrant`] | Qdrant REST vector store |
//! | [`ingest`] | File → pipeline orchestration |
//! | [`collections`] | Collection management commands |
//!
//! The chunking strategies, pipeline, and collaborator traits live in
//! [`docuchunk_core`], which has no I/O dependencies.

pub mod collections;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod ingest;
pub mod qdrant;
