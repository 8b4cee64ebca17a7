//! # docuchunk core
//!
//! Pure chunking engine for docuchunk: data models, the three chunking
//! strategies, the embedding and vector-store capability traits, and the
//! chunk pipeline that ties them together.
//!
//! This crate contains no tokio, HTTP, or filesystem dependencies. Embedding
//! providers and vector stores are supplied by the application through the
//! [`embedding::Embedder`] and [`store::VectorStore`] traits.

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod store;
