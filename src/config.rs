//! TOML configuration for the `docuchunk` binary.
//!
//! Every section is optional; missing keys fall back to documented defaults.
//!
//! ```toml
//! [chunking]
//! strategy = "hierarchical"   # fixed | semantic | hierarchical
//! chunk_size = 512
//! chunk_overlap = 50
//! semantic_threshold = 0.7
//! parent_chunk_size = 2048
//! child_chunk_size = 512
//! include_parents = true
//!
//! [embedding]
//! provider = "openai"         # disabled | openai | cohere | google | ollama | local
//! model = "text-embedding-3-small"
//! dims = 1536
//!
//! [vector_store]
//! url = "http://localhost:6333"
//! collection = "documents"
//!
//! [ingest]
//! max_file_size_mb = 50
//! ```

use anyhow::{bail, Context, Result};
use docuchunk_core::chunk::ChunkingConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

/// Provider names accepted in `[embedding].provider`. `fastembed` is an
/// alias of `local`.
pub const EMBEDDING_PROVIDERS: &[&str] = &[
    "disabled", "openai", "cohere", "google", "ollama", "local", "fastembed",
];

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    /// In-process providers fall back to a built-in default model.
    pub fn is_local(&self) -> bool {
        matches!(self.provider.as_str(), "local" | "fastembed")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct VectorStoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Name of the environment variable holding the Qdrant API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            collection: default_collection(),
            api_key_env: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_store_url() -> String {
    "http://localhost:6333".to_string()
}
fn default_collection() -> String {
    "documents".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

fn default_max_file_size_mb() -> u64 {
    50
}
fn default_allowed_extensions() -> Vec<String> {
    [".txt", ".md", ".pdf", ".docx", ".pptx", ".xlsx", ".html", ".htm"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl IngestConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// Case-insensitive check of a file extension (with or without the dot).
    pub fn allows_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        self.allowed_extensions
            .iter()
            .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(&ext))
    }
}

impl Config {
    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        self.chunking
            .validate()
            .context("Invalid [chunking] section")?;

        if !EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            bail!(
                "Unknown embedding provider: '{}'. Must be one of: {}.",
                self.embedding.provider,
                EMBEDDING_PROVIDERS.join(", ")
            );
        }

        if self.embedding.is_enabled() {
            if self.embedding.dims.is_none() || self.embedding.dims == Some(0) {
                bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    self.embedding.provider
                );
            }
            if self.embedding.model.is_none() && !self.embedding.is_local() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    self.embedding.provider
                );
            }
        }
        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be > 0");
        }

        if self.vector_store.collection.trim().is_empty() {
            bail!("vector_store.collection must not be empty");
        }
        if self.ingest.max_file_size_mb == 0 {
            bail!("ingest.max_file_size_mb must be > 0");
        }

        Ok(())
    }

    /// Replace `[embedding]` fields for one run and re-check the result.
    ///
    /// Switching provider drops a model that was not given alongside it, so
    /// one provider's model name never leaks into another's request.
    pub fn apply_embedding_overrides(
        &mut self,
        provider: Option<&str>,
        model: Option<&str>,
        dims: Option<usize>,
    ) -> Result<()> {
        if let Some(provider) = provider {
            if provider != self.embedding.provider && model.is_none() {
                self.embedding.model = None;
            }
            self.embedding.provider = provider.to_string();
        }
        if let Some(model) = model {
            self.embedding.model = Some(model.to_string());
        }
        if let Some(dims) = dims {
            self.embedding.dims = Some(dims);
        }
        self.validate().context("Invalid embedding overrides")
    }

    /// Configured embedding dimension, treated as authoritative by the pipeline.
    pub fn embedding_dims(&self) -> usize {
        self.embedding.dims.unwrap_or(0)
    }
}

/// Parse and validate configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}
