//! # docuchunk CLI
//!
//! ## Usage
//!
//! ```bash
//! docuchunk --config ./config/docuchunk.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docuchunk ingest <file>` | Extract, chunk, embed, and store one file |
//! | `docuchunk chunk <file>` | Dry run: print the chunks without storing |
//!
//! `ingest` and `chunk` accept `--strategy`, `--chunk-size` and the other
//! `[chunking]` keys as flags, plus `--provider`, `--model` and `--dims` for
//! `[embedding]`.
//! | `docuchunk collections list` | List vector collections |
//! | `docuchunk collections info <name>` | Show counts and status of a collection |
//! | `docuchunk collections delete <name>` | Drop a collection |
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); results go to stdout.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docuchunk::config::{self, Config};
use docuchunk::ingest::{self, ChunkOverrides};
use docuchunk::{collections, qdrant::QdrantStore};
use docuchunk_core::chunk::ChunkingStrategy;
use docuchunk_core::error::PipelineError;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// docuchunk: split documents into retrieval chunks and store their embeddings.
#[derive(Parser)]
#[command(name = "docuchunk", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/docuchunk.toml`. A missing default file means
    /// built-in defaults; an explicitly given file must exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline on one file and store the chunks.
    Ingest {
        file: PathBuf,

        #[command(flatten)]
        chunking: ChunkingArgs,

        #[command(flatten)]
        embedding: EmbeddingArgs,

        /// Target collection (overrides `[vector_store].collection`).
        #[arg(long)]
        collection: Option<String>,
    },

    /// Chunk one file and print the result. Nothing is stored.
    Chunk {
        file: PathBuf,

        #[command(flatten)]
        chunking: ChunkingArgs,

        #[command(flatten)]
        embedding: EmbeddingArgs,
    },

    /// Manage vector collections.
    Collections {
        #[command(subcommand)]
        action: CollectionAction,
    },
}

/// Overrides for the `[chunking]` config section.
#[derive(Args)]
struct ChunkingArgs {
    /// fixed, semantic, or hierarchical.
    #[arg(long)]
    strategy: Option<ChunkingStrategy>,
    #[arg(long)]
    chunk_size: Option<usize>,
    #[arg(long)]
    chunk_overlap: Option<usize>,
    /// Semantic similarity threshold in [0, 1].
    #[arg(long)]
    threshold: Option<f64>,
    #[arg(long)]
    parent_size: Option<usize>,
    #[arg(long)]
    child_size: Option<usize>,
    /// Emit only child chunks in hierarchical mode.
    #[arg(long)]
    no_parents: bool,
}

impl From<&ChunkingArgs> for ChunkOverrides {
    fn from(args: &ChunkingArgs) -> Self {
        ChunkOverrides {
            strategy: args.strategy,
            chunk_size: args.chunk_size,
            chunk_overlap: args.chunk_overlap,
            semantic_threshold: args.threshold,
            parent_chunk_size: args.parent_size,
            child_chunk_size: args.child_size,
            no_parents: args.no_parents,
        }
    }
}

/// Overrides for the `[embedding]` config section.
#[derive(Args)]
struct EmbeddingArgs {
    /// disabled, openai, cohere, google, ollama, or local.
    #[arg(long)]
    provider: Option<String>,
    #[arg(long)]
    model: Option<String>,
    /// Embedding dimension; required by every enabled provider.
    #[arg(long)]
    dims: Option<usize>,
}

impl EmbeddingArgs {
    /// Copy of `base` with these overrides applied and validated.
    fn apply(&self, base: &Config) -> Result<Config> {
        let mut config = base.clone();
        config.apply_embedding_overrides(
            self.provider.as_deref(),
            self.model.as_deref(),
            self.dims,
        )?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum CollectionAction {
    List,
    Info { name: String },
    Delete { name: String },
}

const DEFAULT_CONFIG: &str = "./config/docuchunk.toml";

fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => config::load_config(p),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            config::load_config(Path::new(DEFAULT_CONFIG))
        }
        None => Ok(Config::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = resolve_config(cli.config.as_deref()).context("Failed to load configuration")?;

    let result = match &cli.command {
        Commands::Ingest {
            file,
            chunking,
            embedding,
            collection,
        } => {
            let cfg = embedding.apply(&cfg)?;
            ingest::run_ingest(
                &cfg,
                file,
                &ChunkOverrides::from(chunking),
                collection.as_deref(),
                cli.json,
            )
            .await
        }
        Commands::Chunk {
            file,
            chunking,
            embedding,
        } => {
            let cfg = embedding.apply(&cfg)?;
            ingest::run_chunk(&cfg, file, &ChunkOverrides::from(chunking), cli.json).await
        }
        Commands::Collections { action } => {
            let store = QdrantStore::new(&cfg.vector_store)?;
            match action {
                CollectionAction::List => collections::list(&store, cli.json).await,
                CollectionAction::Info { name } => collections::info(&store, name, cli.json).await,
                CollectionAction::Delete { name } => collections::delete(&store, name).await,
            }
        }
    };

    if let Err(err) = &result {
        if cli.json {
            if let Some(pipeline_err) = err.downcast_ref::<PipelineError>() {
                println!("{}", serde_json::to_string_pretty(&pipeline_err.report())?);
            }
        }
    }
    result
}
